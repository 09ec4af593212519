/// Integration tests for the Leadbook API
///
/// Drive the router against a real PostgreSQL (`DATABASE_URL`):
///
/// ```bash
/// cargo test -p leadbook-api -- --ignored
/// ```

mod common;

use axum::http::{Method, StatusCode};
use common::{ids, wait_for, TestContext};
use leadbook_shared::{
    models::{
        category::{Category, CreateCategory},
        lead::Lead,
        user::User,
    },
    notify::{LEAD_CREATED_BODY, LEAD_CREATED_SUBJECT},
    visibility::LeadFilter,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_agent_lists_only_assigned_leads() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];
    let agent1 = &ctx.org_a.agents[1];

    let mine = ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();
    let theirs = ctx.seed_lead(&ctx.org_a, "Theirs", Some(agent1)).await.unwrap();
    let unassigned = ctx.seed_lead(&ctx.org_a, "Nobody", None).await.unwrap();
    let foreign = ctx
        .seed_lead(&ctx.org_b, "Foreign", Some(&ctx.org_b.agents[0]))
        .await
        .unwrap();

    let (status, body) = ctx.get("/v1/leads", &agent0.member.token).await;
    assert_eq!(status, StatusCode::OK);

    let listed = ids(&body["leads"]);
    assert_eq!(listed, vec![mine.id.to_string()]);
    assert!(!listed.contains(&theirs.id.to_string()));
    assert!(!listed.contains(&unassigned.id.to_string()));
    assert!(!listed.contains(&foreign.id.to_string()));
    assert!(body.get("unassigned_leads").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_organisor_lists_organisation_and_unassigned() {
    let ctx = TestContext::new().await.unwrap();

    let assigned = ctx
        .seed_lead(&ctx.org_a, "Assigned", Some(&ctx.org_a.agents[0]))
        .await
        .unwrap();
    let unassigned = ctx.seed_lead(&ctx.org_a, "Unassigned", None).await.unwrap();
    let foreign = ctx.seed_lead(&ctx.org_b, "Foreign", None).await.unwrap();

    let (status, body) = ctx.get("/v1/leads", &ctx.org_a.organisor.token).await;
    assert_eq!(status, StatusCode::OK);

    let listed = ids(&body["leads"]);
    assert!(listed.contains(&assigned.id.to_string()));
    assert!(listed.contains(&unassigned.id.to_string()));
    assert!(!listed.contains(&foreign.id.to_string()));

    assert_eq!(ids(&body["unassigned_leads"]), vec![unassigned.id.to_string()]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_agent_cannot_create_lead() {
    let ctx = TestContext::new().await.unwrap();
    let filter = LeadFilter::organisation(ctx.org_a.organisation.id);
    let before = Lead::count(&ctx.db, &filter).await.unwrap();

    let (status, body) = ctx
        .post(
            "/v1/leads",
            &ctx.org_a.agents[0].member.token,
            json!({ "first_name": "Sneaky", "last_name": "Lead", "age": 20 }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(Lead::count(&ctx.db, &filter).await.unwrap(), before);
    assert!(ctx.notifier.sent().is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_organisor_creates_lead_and_notifies_once() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post(
            "/v1/leads",
            &ctx.org_a.organisor.token,
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "age": 45,
                "email": "grace@example.com"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["organisation_id"], ctx.org_a.organisation.id.to_string());
    assert!(body["agent_id"].is_null());
    assert!(body["category_id"].is_null());

    let notifier = ctx.notifier.clone();
    wait_for(|| { let notifier = notifier.clone(); async move { !notifier.sent().is_empty() } }, 5)
        .await
        .unwrap();

    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, LEAD_CREATED_SUBJECT);
    assert_eq!(sent[0].body, LEAD_CREATED_BODY);
    assert_eq!(sent[0].sender, ctx.config.notify.from);
    assert_eq!(sent[0].recipients, ctx.config.notify.recipients);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_lead_validation() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post(
            "/v1/leads",
            &ctx.org_a.organisor.token,
            json!({ "first_name": "", "last_name": "Lead", "age": -3 }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    // Whitespace-only names count as blank
    let (status, body) = ctx
        .post(
            "/v1/leads",
            &ctx.org_a.organisor.token,
            json!({ "first_name": "   ", "last_name": "\t", "age": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "first_name");
    assert_eq!(body["details"][1]["field"], "last_name");

    let (_, listed) = ctx.get("/v1/leads", &ctx.org_a.organisor.token).await;
    assert!(ids(&listed["leads"]).is_empty());
    assert!(ctx.notifier.sent().is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_assign_agent_requires_same_organisation() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.seed_lead(&ctx.org_a, "Target", None).await.unwrap();
    let uri = format!("/v1/leads/{}/assign", lead.id);

    let foreign_agent = &ctx.org_b.agents[0].agent;
    let (status, body) = ctx
        .post(&uri, &ctx.org_a.organisor.token, json!({ "agent_id": foreign_agent.id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "agent");

    let unchanged = ctx.load_lead(&ctx.org_a, lead.id).await.unwrap().unwrap();
    assert_eq!(unchanged, lead);

    let own_agent = &ctx.org_a.agents[1].agent;
    let (status, body) = ctx
        .post(&uri, &ctx.org_a.organisor.token, json!({ "agent_id": own_agent.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent_id"], own_agent.id.to_string());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_assign_agent_scope() {
    let ctx = TestContext::new().await.unwrap();
    let foreign_lead = ctx.seed_lead(&ctx.org_b, "Foreign", None).await.unwrap();
    let own_lead = ctx.seed_lead(&ctx.org_a, "Own", None).await.unwrap();
    let agent_id = ctx.org_a.agents[0].agent.id;

    let (status, _) = ctx
        .post(
            &format!("/v1/leads/{}/assign", foreign_lead.id),
            &ctx.org_a.organisor.token,
            json!({ "agent_id": agent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .post(
            &format!("/v1/leads/{}/assign", own_lead.id),
            &ctx.org_a.agents[0].member.token,
            json!({ "agent_id": agent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_agent_lead_detail_outside_scope_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];

    let mine = ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();
    let colleague = ctx
        .seed_lead(&ctx.org_a, "Colleague", Some(&ctx.org_a.agents[1]))
        .await
        .unwrap();
    let foreign = ctx.seed_lead(&ctx.org_b, "Foreign", None).await.unwrap();

    let (status, body) = ctx.get(&format!("/v1/leads/{}", mine.id), &agent0.member.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], mine.id.to_string());

    for id in [colleague.id, foreign.id, Uuid::new_v4()] {
        let (status, body) = ctx.get(&format!("/v1/leads/{id}"), &agent0.member.token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_agent_updates_own_lead() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];
    let mine = ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();
    let colleague = ctx
        .seed_lead(&ctx.org_a, "Colleague", Some(&ctx.org_a.agents[1]))
        .await
        .unwrap();

    let (status, body) = ctx
        .put(&format!("/v1/leads/{}", mine.id), &agent0.member.token, json!({ "age": 51 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 51);
    assert_eq!(body["first_name"], "Mine");

    let (status, _) = ctx
        .put(&format!("/v1/leads/{}", colleague.id), &agent0.member.token, json!({ "age": 51 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_lead_rejects_foreign_category() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.seed_lead(&ctx.org_a, "Mine", None).await.unwrap();
    let foreign = Category::create(
        &ctx.db,
        CreateCategory { organisation_id: ctx.org_b.organisation.id, name: "Won".to_string() },
    )
    .await
    .unwrap();

    let (status, body) = ctx
        .put(
            &format!("/v1/leads/{}", lead.id),
            &ctx.org_a.organisor.token,
            json!({ "first_name": "Changed", "category_id": foreign.id }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "category");

    let unchanged = ctx.load_lead(&ctx.org_a, lead.id).await.unwrap().unwrap();
    assert_eq!(unchanged, lead);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_lead_clears_contact_fields() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.seed_lead(&ctx.org_a, "Reachable", None).await.unwrap();
    let uri = format!("/v1/leads/{}", lead.id);
    let token = &ctx.org_a.organisor.token;

    let (status, body) = ctx
        .put(&uri, token, json!({ "email": "lead@example.com", "phone_number": "555-0100" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "lead@example.com");

    // Absent leaves them alone
    let (_, body) = ctx.put(&uri, token, json!({ "age": 31 })).await;
    assert_eq!(body["phone_number"], "555-0100");

    let (status, body) = ctx.put(&uri, token, json!({ "email": null, "phone_number": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["email"].is_null());
    assert!(body["phone_number"].is_null());
    assert_eq!(body["age"], 31);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_uncategorised_count_is_organisation_wide_for_agents() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];

    ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();
    ctx.seed_lead(&ctx.org_a, "Colleague", Some(&ctx.org_a.agents[1])).await.unwrap();
    ctx.seed_lead(&ctx.org_a, "Nobody", None).await.unwrap();
    ctx.seed_lead(&ctx.org_b, "Foreign", None).await.unwrap();

    let expected = Lead::count(
        &ctx.db,
        &LeadFilter::organisation(ctx.org_a.organisation.id).uncategorised(),
    )
    .await
    .unwrap();
    assert_eq!(expected, 3);

    let (status, body) = ctx.get("/v1/categories", &agent0.member.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unassigned_lead_count"], expected);

    let (_, leads) = ctx.get("/v1/leads", &agent0.member.token).await;
    assert_eq!(ids(&leads["leads"]).len(), 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_lead_permissions() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];
    let mine = ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();
    let foreign = ctx.seed_lead(&ctx.org_b, "Foreign", None).await.unwrap();

    let (status, _) = ctx.delete(&format!("/v1/leads/{}", mine.id), &agent0.member.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.load_lead(&ctx.org_a, mine.id).await.unwrap().is_some());

    let (status, _) = ctx
        .delete(&format!("/v1/leads/{}", foreign.id), &ctx.org_a.organisor.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(ctx.load_lead(&ctx.org_b, foreign.id).await.unwrap().is_some());

    let (status, body) = ctx
        .delete(&format!("/v1/leads/{}", mine.id), &ctx.org_a.organisor.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(ctx.load_lead(&ctx.org_a, mine.id).await.unwrap().is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_lead_category() {
    let ctx = TestContext::new().await.unwrap();
    let agent0 = &ctx.org_a.agents[0];
    let lead = ctx.seed_lead(&ctx.org_a, "Mine", Some(agent0)).await.unwrap();

    let own = Category::create(
        &ctx.db,
        CreateCategory { organisation_id: ctx.org_a.organisation.id, name: "Contacted".to_string() },
    )
    .await
    .unwrap();
    let foreign = Category::create(
        &ctx.db,
        CreateCategory { organisation_id: ctx.org_b.organisation.id, name: "Contacted".to_string() },
    )
    .await
    .unwrap();

    let uri = format!("/v1/leads/{}/category", lead.id);

    let (status, body) = ctx.put(&uri, &agent0.member.token, json!({ "category_id": foreign.id })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "category");

    let (status, body) = ctx.put(&uri, &agent0.member.token, json!({ "category_id": own.id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lead"]["category_id"], own.id.to_string());
    assert_eq!(body["lead_url"], format!("/v1/leads/{}", lead.id));

    let (status, body) = ctx.get(&format!("/v1/categories/{}", own.id), &agent0.member.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["leads"]), vec![lead.id.to_string()]);

    let (status, body) = ctx.put(&uri, &agent0.member.token, json!({ "category_id": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["lead"]["category_id"].is_null());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_category_management() {
    let ctx = TestContext::new().await.unwrap();
    let organisor = &ctx.org_a.organisor.token;
    let agent = &ctx.org_a.agents[0].member.token;

    let (status, _) = ctx.post("/v1/categories", agent, json!({ "name": "Hot" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = ctx.post("/v1/categories", organisor, json!({ "name": "Hot" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = ctx.post("/v1/categories", organisor, json!({ "name": "Hot" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = ctx
        .put(&format!("/v1/categories/{id}"), organisor, json!({ "name": "Warm" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Warm");

    let (status, _) = ctx.get(&format!("/v1/categories/{id}"), &ctx.org_b.organisor.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&format!("/v1/categories/{id}"), organisor).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_agent_management() {
    let ctx = TestContext::new().await.unwrap();
    let organisor = &ctx.org_a.organisor.token;
    let email = format!("new-agent-{}@example.com", Uuid::new_v4());

    let (status, _) = ctx.get("/v1/agents", &ctx.org_a.agents[0].member.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = ctx
        .post("/v1/agents", organisor, json!({ "email": email, "first_name": "New", "last_name": "Agent" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["organisation_id"], ctx.org_a.organisation.id.to_string());
    let id = created["id"].as_str().unwrap().to_string();

    let notifier = ctx.notifier.clone();
    wait_for(|| { let notifier = notifier.clone(); async move { !notifier.sent().is_empty() } }, 5)
        .await
        .unwrap();
    assert_eq!(ctx.notifier.sent()[0].recipients, vec![email.clone()]);

    let (status, body) = ctx.get("/v1/agents", organisor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body).len(), 3);

    let (status, body) = ctx
        .put(&format!("/v1/agents/{id}"), organisor, json!({ "first_name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Renamed");
    assert_eq!(body["email"], email);

    let (status, _) = ctx.get(&format!("/v1/agents/{id}"), &ctx.org_b.organisor.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&format!("/v1/agents/{id}"), organisor).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(User::find_by_email(&ctx.db, &email).await.unwrap().is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_invited_agent_replaces_temporary_password() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("invitee-{}@example.com", Uuid::new_v4());

    let (status, _) = ctx
        .post(
            "/v1/agents",
            &ctx.org_a.organisor.token,
            json!({ "email": email, "first_name": "Ivy", "last_name": "Invitee" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let notifier = ctx.notifier.clone();
    wait_for(|| { let notifier = notifier.clone(); async move { !notifier.sent().is_empty() } }, 5)
        .await
        .unwrap();
    let invitation = ctx.notifier.sent()[0].clone();
    let temporary = invitation.body.trim_end().lines().last().unwrap().to_string();

    let login = |password: String| {
        let email = email.clone();
        let ctx = &ctx;
        async move {
            ctx.request(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await
        }
    };

    let (status, session) = login(temporary.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["is_organisor"], false);
    let token = session["access_token"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .put(
            "/v1/account/password",
            &token,
            json!({ "current_password": "not it at all 9", "new_password": "my own secret 77" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "current_password");

    let (status, _) = ctx
        .put(
            "/v1/account/password",
            &token,
            json!({ "current_password": temporary, "new_password": "my own secret 77" }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = login(temporary.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login("my own secret 77".to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_signup_login_refresh() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("Founder-{}@Example.com", Uuid::new_v4());

    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": "launch day 2024",
                "first_name": "Fran",
                "last_name": "Founder",
                "organisation_name": "Startup"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "Bearer");
    let access = body["access_token"].as_str().unwrap().to_string();

    let (status, leads) = ctx.get("/v1/leads", &access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(leads["unassigned_leads"], json!([]));

    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({
                "email": email.to_lowercase(),
                "password": "launch day 2024",
                "first_name": "Fran",
                "last_name": "Founder",
                "organisation_name": "Startup"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong password 1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "launch day 2024" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["is_organisor"], true);

    let (status, refreshed) = ctx
        .request(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": login["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["access_token"].is_string());

    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_missing_or_bad_token_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/v1/leads", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/v1/leads", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_health() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}
