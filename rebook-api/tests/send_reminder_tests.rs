/// `/send-reminder` and `/v1/campaigns/:id/send` behavior
///
/// Covers the validation order, per-customer failure isolation and run
/// bookkeeping.

mod common;

use axum::http::StatusCode;
use common::{TestContext, OTHER_SALON_ID, SALON_ID};
use serde_json::json;
use uuid::Uuid;

const CONTENT: &str = "Hi {{name}}, it's time for your next {{service}} at {{salon}}!";

async fn send_reminder(ctx: &TestContext, campaign_id: &str, salon_id: &str) -> (StatusCode, serde_json::Value) {
    ctx.send(
        "POST",
        "/send-reminder",
        None,
        Some(json!({ "campaignId": campaign_id, "salonId": salon_id })),
    )
    .await
}

#[tokio::test]
async fn test_missing_params() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send("POST", "/send-reminder", None, Some(json!({ "campaignId": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Campaign ID and Salon ID are required");

    let (status, _) = ctx
        .send("POST", "/send-reminder", None, Some(json!({ "salonId": SALON_ID })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_campaign() {
    let ctx = TestContext::new().await;

    let (status, body) = send_reminder(&ctx, &Uuid::new_v4().to_string(), SALON_ID).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Campaign not found");

    let (status, _) = send_reminder(&ctx, "not-a-uuid", SALON_ID).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ownership_mismatch() {
    let ctx = TestContext::new().await;
    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;

    let (status, body) = send_reminder(&ctx, campaign["id"].as_str().unwrap(), OTHER_SALON_ID).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized access to campaign");
}

#[tokio::test]
async fn test_deleted_template() {
    let ctx = TestContext::new().await;
    ctx.configure_whatsapp().await;
    let template = ctx.create_template(CONTENT).await;
    let template_id = template["id"].as_str().unwrap();
    let campaign = ctx.create_campaign(template_id, None, 30).await;

    let (status, _) = ctx.call("DELETE", &format!("/v1/templates/{template_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_reminder(&ctx, campaign["id"].as_str().unwrap(), SALON_ID).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Template not found");
}

#[tokio::test]
async fn test_whatsapp_not_configured() {
    let ctx = TestContext::new().await;
    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;

    let (status, body) = send_reminder(&ctx, campaign["id"].as_str().unwrap(), SALON_ID).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "WhatsApp API not configured");
}

#[tokio::test]
async fn test_nobody_due_records_nothing() {
    let ctx = TestContext::new().await;
    ctx.configure_whatsapp().await;
    ctx.create_customer("Asha Rao", "555 123 4567", "Haircut", 5).await;
    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;
    let campaign_id = campaign["id"].as_str().unwrap();

    let (status, body) = send_reminder(&ctx, campaign_id, SALON_ID).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No customers due for reminders");
    assert_eq!(body["total"], 0);

    let (_, campaign) = ctx.call("GET", &format!("/v1/campaigns/{campaign_id}"), None).await;
    assert!(campaign["last_run"].is_null());
    assert!(ctx.messenger.sent().await.is_empty());
}

#[tokio::test]
async fn test_dispatch_sends_to_due_customers_only() {
    let ctx = TestContext::new().await;
    ctx.configure_whatsapp().await;
    ctx.create_customer("Asha Rao", "(555) 123-4567", "Color", 40).await;
    ctx.create_customer("Bina Shah", "555 987 6543", "Haircut", 45).await;
    ctx.create_customer("Chitra Iyer", "555 222 3333", "Color", 3).await;

    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx
        .create_campaign(template["id"].as_str().unwrap(), Some("Color"), 30)
        .await;
    let campaign_id = campaign["id"].as_str().unwrap();

    let (status, body) = send_reminder(&ctx, campaign_id, SALON_ID).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Sent 1 of 1 reminders");
    assert_eq!(body["results"][0]["name"], "Asha Rao");
    assert_eq!(body["results"][0]["success"], true);

    let sent = ctx.messenger.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone_number_id, "1098765");
    assert_eq!(sent[0].message.to, "15551234567");
    assert_eq!(
        sent[0].message.body_parameters(),
        vec!["Asha Rao", "Color", "Glow Studio"]
    );
}

#[tokio::test]
async fn test_failures_are_isolated_and_run_recorded() {
    let ctx = TestContext::new().await;
    ctx.configure_whatsapp().await;
    ctx.create_customer("Asha Rao", "555 123 4567", "Haircut", 40).await;
    ctx.create_customer("Bina Shah", "555 987 6543", "Haircut", 60).await;
    ctx.messenger.fail_for("15559876543").await;

    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;
    let campaign_id = campaign["id"].as_str().unwrap();

    let (status, body) = ctx
        .call("POST", &format!("/v1/campaigns/{campaign_id}/send"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["sent"], 1);
    assert_eq!(body["failed"], 1);

    let results = body["results"].as_array().unwrap();
    let failed = results.iter().find(|r| r["success"] == false).unwrap();
    assert_eq!(failed["name"], "Bina Shah");
    assert!(failed["error"].is_string());

    let (_, campaign) = ctx.call("GET", &format!("/v1/campaigns/{campaign_id}"), None).await;
    assert!(campaign["last_run"].is_string());
    assert_eq!(campaign["messages_sent"], 1);
}

#[tokio::test]
async fn test_run_recorded_when_every_send_fails() {
    let ctx = TestContext::new().await;
    ctx.configure_whatsapp().await;
    ctx.create_customer("Asha Rao", "555 123 4567", "Haircut", 40).await;
    ctx.messenger.fail_for("15551234567").await;

    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;
    let campaign_id = campaign["id"].as_str().unwrap();

    let (status, body) = send_reminder(&ctx, campaign_id, SALON_ID).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sent 0 of 1 reminders");

    let (_, campaign) = ctx.call("GET", &format!("/v1/campaigns/{campaign_id}"), None).await;
    assert!(campaign["last_run"].is_string());
    assert_eq!(campaign["messages_sent"], 0);
}

#[tokio::test]
async fn test_due_preview() {
    let ctx = TestContext::new().await;
    ctx.create_customer("Asha Rao", "555 123 4567", "Haircut", 40).await;
    ctx.create_customer("Bina Shah", "555 987 6543", "Haircut", 10).await;

    let template = ctx.create_template(CONTENT).await;
    let campaign = ctx.create_campaign(template["id"].as_str().unwrap(), None, 30).await;
    let campaign_id = campaign["id"].as_str().unwrap();

    let (status, body) = ctx
        .call("GET", &format!("/v1/campaigns/{campaign_id}/due"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["customers"][0]["name"], "Asha Rao");
    assert_eq!(body["customers"][0]["recency"]["tier"], "overdue");

    let (status, _) = ctx
        .send(
            "GET",
            &format!("/v1/campaigns/{campaign_id}/due"),
            Some(&ctx.other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
