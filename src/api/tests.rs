use super::*;
use crate::assessment::ImpactAnalyst;
use crate::config::LlmConfig;
use crate::database::test_support::setup_test_db;
use crate::llm::OpenAIClient;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use httptest::{Expectation, Server, matchers::*, responders::*};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

async fn app(llm: Option<&Server>) -> (TempDir, Router) {
    let (tmp, db) = setup_test_db().await;
    let analyst = llm.map(|server| {
        let client = OpenAIClient::new(server.url_str("/v1"), "test-key")
            .unwrap()
            .with_llm_config(LlmConfig {
                request_timeout_ms: 5_000,
                ..LlmConfig::default()
            });
        ImpactAnalyst::new(client, "gpt-test")
    });
    (tmp, build_router(AppState::new(db, analyst)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn completion(content: &str) -> Value {
    json!({
        "id": "test",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}}
        ]
    })
}

struct Matrix {
    project: String,
    activity: String,
    component: String,
}

async fn seed(app: &Router) -> Matrix {
    let (status, project) = send(app, "POST", "/projects", Some(json!({"name": "Dam A"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let project = project["id"].as_str().unwrap().to_string();

    let (status, activity) = send(
        app,
        "POST",
        &format!("/projects/{project}/activities"),
        Some(json!({"name": "Excavation", "phase": "construction"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, component) = send(
        app,
        "POST",
        &format!("/projects/{project}/components"),
        Some(json!({"name": "River flow", "category": "physique"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    Matrix {
        project,
        activity: activity["id"].as_str().unwrap().to_string(),
        component: component["id"].as_str().unwrap().to_string(),
    }
}

async fn add_impact(app: &Router, m: &Matrix, magnitude: i64, importance: i64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/projects/{}/impacts", m.project),
        Some(json!({
            "magnitude": magnitude,
            "importance": importance,
            "activityId": m.activity,
            "environmentalComponentId": m.component,
        })),
    )
    .await
}

#[tokio::test]
async fn health_reports_version() {
    let (_tmp, app) = app(None).await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn builds_a_matrix_end_to_end() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;

    let (status, impact) = add_impact(&app, &m, -5, 8).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(impact["activity"]["name"], "Excavation");

    let (status, project) = send(&app, "GET", &format!("/projects/{}", m.project), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["name"], "Dam A");
    let impacts = project["impacts"].as_array().unwrap();
    assert_eq!(impacts.len(), 1);
    assert_eq!(impacts[0]["activityId"], m.activity);
    assert_eq!(impacts[0]["environmentalComponentId"], m.component);
    assert_eq!(impacts[0]["magnitude"], -5);
    assert_eq!(impacts[0]["environmentalComponent"]["category"], "physique");
    assert_eq!(project["activities"].as_array().unwrap().len(), 1);
    assert_eq!(project["components"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_itemized() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;

    let (status, body) = add_impact(&app, &m, 0, 11).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid data");
    let fields: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_string())
        .collect();
    assert!(fields.contains(&"magnitude".to_string()));
    assert!(fields.contains(&"importance".to_string()));

    let (status, body) = send(
        &app,
        "POST",
        "/projects",
        Some(json!({"name": "ab", "description": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");

    let (status, body) = send(&app, "GET", "/projects/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "id");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let (_tmp, app) = app(None).await;
    let req = Request::builder()
        .method("POST")
        .uri("/projects")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn records_of_another_project_are_not_found() {
    let (_tmp, app) = app(None).await;
    let a = seed(&app).await;
    let b = seed(&app).await;

    let crossed = Matrix {
        project: a.project.clone(),
        activity: b.activity.clone(),
        component: a.component.clone(),
    };
    let (status, body) = add_impact(&app, &crossed, -2, 3).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Activity not found");

    let (status, _) = send(
        &app,
        "GET",
        &format!("/projects/{}/components/{}", a.project, b.component),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/projects/{missing}/activities"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn occupied_cell_conflicts() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;
    let (status, first) = add_impact(&app, &m, -5, 8).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = add_impact(&app, &m, 3, 2).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Replacing an impact in place keeps its own cell.
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/projects/{}/impacts/{}", m.project, first["id"].as_str().unwrap()),
        Some(json!({
            "magnitude": 4,
            "importance": 6,
            "activityId": m.activity,
            "environmentalComponentId": m.component,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["magnitude"], 4);
}

#[tokio::test]
async fn deleting_an_activity_removes_its_impacts() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;
    add_impact(&app, &m, -5, 8).await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/projects/{}/activities/{}", m.project, m.activity),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Activity deleted");

    let (_, impacts) = send(&app, "GET", &format!("/projects/{}/impacts", m.project), None).await;
    assert!(impacts.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/projects/{}/activities/{}", m.project, m.activity),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_project_removes_everything() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;
    add_impact(&app, &m, -5, 8).await;

    let (status, _) = send(&app, "DELETE", &format!("/projects/{}", m.project), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/projects/{}", m.project), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = send(&app, "GET", "/projects", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn project_analysis_replaces_impacts_with_usable_suggestions() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;
    let (_, old) = add_impact(&app, &m, -1, 1).await;

    let answer = format!(
        "IMPACTS SUGGÉRÉS:\n\
         1. Activité ID: {a}, Composante ID: {c}, Magnitude: -7, Importance: 9, Justification: Sediment load\n\
         2. Activité ID: {a}, Composante ID: {c}, Magnitude: -2, Justification: missing importance\n\
         3. Activité ID: {a}, Composante ID: {unknown}, Magnitude: -3, Importance: 4, Justification: unknown component\n\
         4. Activité ID: {a}, Composante ID: {c}, Magnitude: 0, Importance: 4, Justification: neutral\n\
         \n\
         SYNTHÈSE NARRATIVE:\n\
         The river bears most of the impact.",
        a = m.activity,
        c = m.component,
        unknown = uuid::Uuid::new_v4(),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
            .respond_with(json_encoded(completion(&answer))),
    );

    let (status, body) = send(&app, "POST", &format!("/projects/{}/analyze", m.project), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "The river bears most of the impact.");
    assert_eq!(body["suggestedImpacts"].as_array().unwrap().len(), 3);
    assert_eq!(body["suggestedImpacts"][0]["activityName"], "Excavation");
    assert_eq!(body["suggestedImpacts"][1]["componentName"], Value::Null);
    assert_eq!(body["skipped"], 2);
    assert_eq!(body["createdImpacts"].as_array().unwrap().len(), 1);

    let (_, impacts) = send(&app, "GET", &format!("/projects/{}/impacts", m.project), None).await;
    let impacts = impacts.as_array().unwrap();
    assert_eq!(impacts.len(), 1);
    assert_ne!(impacts[0]["id"], old["id"]);
    assert_eq!(impacts[0]["magnitude"], -7);
    assert_eq!(impacts[0]["description"], "Sediment load");
}

#[tokio::test]
async fn failed_project_analysis_keeps_existing_impacts() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;
    add_impact(&app, &m, -1, 1).await;
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
            .respond_with(status_code(429).body("quota")),
    );

    let (status, body) = send(&app, "POST", &format!("/projects/{}/analyze", m.project), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("try again later"));

    let (_, impacts) = send(&app, "GET", &format!("/projects/{}/impacts", m.project), None).await;
    assert_eq!(impacts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn management_plan_needs_impacts() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;

    let (status, body) = send(&app, "POST", &format!("/projects/{}/pges", m.project), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no impacts"));
}

#[tokio::test]
async fn management_plan_is_decoded() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;
    add_impact(&app, &m, -8, 9).await;
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/v1/chat/completions"),
            request::body(json_decoded(|body: &Value| {
                body["messages"][1]["content"]
                    .as_str()
                    .is_some_and(|c| c.contains("Activité: Excavation (construction)"))
            })),
        ])
        .respond_with(json_encoded(completion(
            "SYNTHÈSE:\nRiver first.\n\nPRIORISATION DES IMPACTS:\n\
             1. Activité: Excavation, Composante: River flow, Magnitude: -8, Importance: 9, Priorité: Élevée\n\n\
             RECOMMANDATIONS:\n1. Catégorie: Eau\n   - Silt curtain\n\n\
             PLAN DE SUIVI:\n1. Indicateur: Turbidité, Fréquence: Hebdomadaire, Responsable: Entreprise",
        ))),
    );

    let (status, body) = send(&app, "POST", &format!("/projects/{}/pges", m.project), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pges"]["summary"], "River first.");
    assert_eq!(body["pges"]["prioritizedImpacts"][0]["priority"], "Élevée");
    assert_eq!(body["pges"]["recommendations"][0]["measures"][0], "Silt curtain");
    assert_eq!(body["pges"]["monitoringPlan"][0]["responsibleParty"], "Entreprise");
}

#[tokio::test]
async fn impact_analysis_is_stored_on_the_impact() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;
    let (_, impact) = add_impact(&app, &m, -5, 8).await;
    let impact_id = impact["id"].as_str().unwrap().to_string();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/v1/chat/completions"),
            request::body(json_decoded(|body: &Value| {
                body["messages"][1]["content"]
                    .as_str()
                    .is_some_and(|c| c.contains("- Magnitude: -5"))
            })),
        ])
        .respond_with(json_encoded(completion(
            "JUSTIFICATION: Large cut\nANALYSE: Turbidity rises\nMESURES D'ATTÉNUATION:\n- Silt curtain\n- Night work ban",
        ))),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/impacts/analyze",
        Some(json!({"impactId": impact_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["analysis"], "Turbidity rises");
    assert_eq!(body["analysis"]["magnitude"], -5);
    assert_eq!(body["impact"]["aiAnalysis"], "Turbidity rises");

    let (_, stored) = send(
        &app,
        "GET",
        &format!("/projects/{}/impacts/{impact_id}", m.project),
        None,
    )
    .await;
    assert_eq!(stored["aiAnalysis"], "Turbidity rises");
    assert_eq!(stored["mitigationMeasures"], "- Silt curtain\n- Night work ban");
}

#[tokio::test]
async fn impact_analysis_of_unknown_impact_is_not_found() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let (status, _) = send(
        &app,
        "POST",
        "/impacts/analyze",
        Some(json!({"impactId": uuid::Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/impacts/analyze", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "impactId");
}

#[tokio::test]
async fn evaluation_previews_scores_without_storing() {
    let server = Server::run();
    let (_tmp, app) = app(Some(&server)).await;
    let m = seed(&app).await;
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions")).respond_with(
            json_encoded(completion(
                "MAGNITUDE: -6\nIMPORTANCE: 7\nJUSTIFICATION: Cut banks\nANALYSE: Erosion",
            )),
        ),
    );

    let (status, body) = send(
        &app,
        "POST",
        &format!("/projects/{}/impacts/evaluate", m.project),
        Some(json!({"activityId": m.activity, "environmentalComponentId": m.component})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["magnitude"], -6);
    assert_eq!(body["analysis"]["importance"], 7);
    assert_eq!(body["activityId"], m.activity);

    let (_, impacts) = send(&app, "GET", &format!("/projects/{}/impacts", m.project), None).await;
    assert!(impacts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analysis_without_api_key_is_a_server_error() {
    let (_tmp, app) = app(None).await;
    let m = seed(&app).await;
    let (status, body) = send(&app, "POST", &format!("/projects/{}/analyze", m.project), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("try again later"));
}
