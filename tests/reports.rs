//! Report Tests
//!
//! Covers report creation and scoring, image uploads, listing filters and
//! ranking, deletion rights and the admin score/resolve actions.

mod common;

use axum::http::StatusCode;
use common::{app, report_id, PNG_BYTES, UPLOAD_MAX_BYTES};
use reportes::infra::store::ReportStore;

// ===========================================================================
// Creation
// ===========================================================================

#[tokio::test]
async fn create_report_scores_and_titles() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let report = app
        .create_report(&cookie, "Incendio", "Hay fuego y humo en el deposito")
        .await;

    assert_eq!(report["risk_type"], "Incendio");
    assert_eq!(report["score"], 5);
    assert_eq!(report["username"], "ana");
    assert_eq!(report["resolved"], false);
    assert_eq!(report["title"], "Hay fuego y humo en el deposito");
    assert!(report["image_ref"].is_null());
}

#[tokio::test]
async fn create_report_with_keyword_bonus() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let report = app.create_report(&cookie, "Ambiental", "mucho ruido").await;

    assert_eq!(report["score"], 2);
}

#[tokio::test]
async fn create_report_with_empty_description_uses_base_weight() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let caida = app.create_report(&cookie, "Caida", "").await;
    let other = app.create_report(&cookie, "Otro", "").await;

    assert_eq!(caida["score"], 3);
    assert_eq!(caida["title"], "");
    assert_eq!(other["score"], 2);
    assert_eq!(other["risk_type"], "Otro");
}

#[tokio::test]
async fn create_report_canonicalizes_category() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let report = app.create_report(&cookie, "  incendio ", "humo").await;

    assert_eq!(report["risk_type"], "Incendio");
}

#[tokio::test]
async fn create_report_folds_accented_category() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let report = app.create_report(&cookie, "Químico", "fuga de gas tóxico").await;

    assert_eq!(report["risk_type"], "Quimico");
    assert_eq!(report["score"], 5);
    assert_eq!(
        app.listed_ids(&cookie, "?risk_type=Qu%C3%ADmico").await,
        vec![report_id(&report)]
    );
}

#[tokio::test]
async fn create_report_rejects_non_multipart_body() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_form("/new_report", &[("risk_type", "Caida"), ("descripcion", "algo")], Some(&cookie))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(
        resp.error_message().starts_with("invalid multipart body"),
        "{}",
        resp.error_message()
    );
}

#[tokio::test]
async fn title_is_first_fifty_characters() {
    let app = app().await;
    let cookie = app.login("ana").await;
    let description = "ñ".repeat(60);

    let report = app.create_report(&cookie, "Caida", &description).await;

    let title = report["title"].as_str().unwrap();
    assert_eq!(title.chars().count(), 50);
    assert_eq!(report["description"].as_str().unwrap(), description);
}

#[tokio::test]
async fn create_report_requires_risk_type() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let missing = app
        .post_multipart("/new_report", &[("descripcion", "algo")], None, Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.error_message(), "risk_type is required");

    let blank = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "  "), ("descripcion", "algo")],
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_report_requires_description_field() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_multipart("/new_report", &[("risk_type", "Caida")], None, Some(&cookie))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "descripcion is required");
}

#[tokio::test]
async fn new_report_form_lists_catalog() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app.get("/new_report", Some(&cookie)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let risk_types = body["risk_types"].as_array().unwrap();
    assert_eq!(risk_types.len(), 10);
    assert_eq!(risk_types[0]["name"], "Incendio");
    assert_eq!(risk_types[0]["weight"], 5);
    assert!(risk_types[0].get("keywords").is_none());
    assert_eq!(body["max_upload_bytes"], UPLOAD_MAX_BYTES);
}

// ===========================================================================
// Images
// ===========================================================================

#[tokio::test]
async fn uploaded_image_is_stored_and_served() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "Electrico"), ("descripcion", "cable suelto")],
            Some(("foto.png", PNG_BYTES)),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.error_message());

    let image_ref = resp.json()["image_ref"].as_str().unwrap().to_string();
    assert!(image_ref.starts_with("/uploads/reports/"));
    assert!(image_ref.ends_with(".png"));

    let served = app.get(&image_ref, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.bytes(), PNG_BYTES);
}

#[tokio::test]
async fn empty_file_part_means_no_image() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "Caida"), ("descripcion", "piso mojado")],
            Some(("", &b""[..])),
            Some(&cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["image_ref"].is_null());
}

#[tokio::test]
async fn unsupported_image_is_rejected() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "Caida"), ("descripcion", "piso mojado")],
            Some(("notas.txt", &b"just some text"[..])),
            Some(&cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "unsupported image format");

    let ids = app.listed_ids(&cookie, "").await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let app = app().await;
    let cookie = app.login("ana").await;
    let mut data = PNG_BYTES.to_vec();
    data.resize(UPLOAD_MAX_BYTES + 1024, 0);

    let resp = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "Caida"), ("descripcion", "piso mojado")],
            Some(("grande.png", data.as_slice())),
            Some(&cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "image exceeds the upload limit");
}

#[tokio::test]
async fn deleting_report_removes_its_image() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app
        .post_multipart(
            "/new_report",
            &[("risk_type", "Electrico"), ("descripcion", "chispa")],
            Some(("foto.png", PNG_BYTES)),
            Some(&cookie),
        )
        .await;
    let report = resp.json();
    let image_ref = report["image_ref"].as_str().unwrap().to_string();

    let deleted = app
        .post(&format!("/delete/{}", report_id(&report)), Some(&cookie))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let served = app.get(&image_ref, None).await;
    assert_eq!(served.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Listing
// ===========================================================================

#[tokio::test]
async fn listing_ranks_by_score_then_likes() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let a = report_id(&app.create_report(&cookie, "Caida", "").await);
    let b = report_id(&app.create_report(&cookie, "Incendio", "").await);
    let c = report_id(&app.create_report(&cookie, "Caida", "").await);

    for i in 0..10 {
        let liker = app.login(&format!("vecino{}", i)).await;
        app.post(&format!("/like_ajax/{}", a), Some(&liker)).await;
    }
    for i in 0..2 {
        let liker = app.login(&format!("vecino{}", i)).await;
        app.post(&format!("/like_ajax/{}", c), Some(&liker)).await;
    }
    let liker = app.login("vecino0").await;
    app.post(&format!("/like_ajax/{}", b), Some(&liker)).await;

    assert_eq!(app.listed_ids(&cookie, "").await, vec![b, a, c]);
}

#[tokio::test]
async fn listing_ties_keep_insertion_order() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let first = report_id(&app.create_report(&cookie, "Caida", "uno").await);
    let second = report_id(&app.create_report(&cookie, "Mecanico", "dos").await);
    let third = report_id(&app.create_report(&cookie, "Transito", "tres").await);

    assert_eq!(app.listed_ids(&cookie, "").await, vec![first, second, third]);
}

#[tokio::test]
async fn listing_filters_by_category() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let fire = report_id(&app.create_report(&cookie, "Incendio", "").await);
    let fall = report_id(&app.create_report(&cookie, "Caida", "").await);

    assert_eq!(app.listed_ids(&cookie, "?risk_type=Incendio").await, vec![fire]);
    assert_eq!(app.listed_ids(&cookie, "?risk_type=caida").await, vec![fall]);
    assert_eq!(app.listed_ids(&cookie, "?risk_type=todos").await, vec![fire, fall]);
    assert!(app.listed_ids(&cookie, "?risk_type=Quimico").await.is_empty());
}

#[tokio::test]
async fn listing_filters_by_resolution() {
    let app = app().await;
    let cookie = app.login("ana").await;
    let admin = app.login_admin().await;

    let open = report_id(&app.create_report(&cookie, "Caida", "").await);
    let done = report_id(&app.create_report(&cookie, "Incendio", "").await);
    let resp = app.post(&format!("/mark_resolved/{}", done), Some(&admin)).await;
    assert_eq!(resp.status, StatusCode::OK);

    assert_eq!(app.listed_ids(&cookie, "").await, vec![open]);
    assert_eq!(app.listed_ids(&cookie, "?solucionado=no").await, vec![open]);
    assert_eq!(app.listed_ids(&cookie, "?solucionado=si").await, vec![done]);
    assert_eq!(app.listed_ids(&cookie, "?solucionado=todos").await, vec![done, open]);
}

#[tokio::test]
async fn listing_rejects_unknown_resolution_filter() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app.get("/?solucionado=quizas", Some(&cookie)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "solucionado must be one of: no, si, todos");
}

#[tokio::test]
async fn listing_echoes_filters_and_viewer() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let body = app
        .get("/?risk_type=Incendio&solucionado=todos", Some(&cookie))
        .await
        .json();

    assert_eq!(body["filters"]["risk_type"], "Incendio");
    assert_eq!(body["filters"]["solucionado"], "all");
    assert_eq!(body["viewer"]["username"], "ana");
    assert_eq!(body["viewer"]["role"], "user");
}

#[tokio::test]
async fn listing_shows_viewer_like_state_and_comments() {
    let app = app().await;
    let ana = app.login("ana").await;
    let beto = app.login("beto").await;

    let id = report_id(&app.create_report(&ana, "Caida", "escalera rota").await);
    app.post(&format!("/like_ajax/{}", id), Some(&ana)).await;
    app.post_form(&format!("/comment_ajax/{}", id), &[("comment_text", "ya aviso")], Some(&beto))
        .await;

    let seen_by_ana = app.get("/", Some(&ana)).await.json();
    let card = &seen_by_ana["items"][0];
    assert_eq!(card["likes"], 1);
    assert_eq!(card["liked"], true);
    assert_eq!(card["comments"][0]["text"], "ya aviso");
    assert_eq!(card["comments"][0]["username"], "beto");

    let seen_by_beto = app.get("/", Some(&beto)).await.json();
    assert_eq!(seen_by_beto["items"][0]["liked"], false);
}

#[tokio::test]
async fn get_report_detail() {
    let app = app().await;
    let cookie = app.login("ana").await;
    let id = report_id(&app.create_report(&cookie, "Caida", "hueco").await);

    let resp = app.get(&format!("/report/{}", id), Some(&cookie)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["id"], id);

    let missing = app.get("/report/9999", Some(&cookie)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_message(), "report not found");
}

// ===========================================================================
// Deletion
// ===========================================================================

#[tokio::test]
async fn author_deletes_report_with_likes_and_comments() {
    let app = app().await;
    let ana = app.login("ana").await;
    let beto = app.login("beto").await;

    let id = report_id(&app.create_report(&ana, "Caida", "hueco").await);
    app.post(&format!("/like_ajax/{}", id), Some(&beto)).await;
    app.post_form(&format!("/comment_ajax/{}", id), &[("comment_text", "cuidado")], Some(&beto))
        .await;

    let resp = app.post(&format!("/delete/{}", id), Some(&ana)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["deleted"], true);

    let gone = app.get(&format!("/report/{}", id), Some(&ana)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert!(app.store.list_comments(&[id]).await.unwrap().is_empty());
    assert!(app.store.liked_by("beto", &[id]).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_user_cannot_delete_report() {
    let app = app().await;
    let ana = app.login("ana").await;
    let beto = app.login("beto").await;
    let id = report_id(&app.create_report(&ana, "Caida", "hueco").await);

    let resp = app.post(&format!("/delete/{}", id), Some(&beto)).await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "not allowed");
    let still_there = app.get(&format!("/report/{}", id), Some(&ana)).await;
    assert_eq!(still_there.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_deletes_any_report() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let id = report_id(&app.create_report(&ana, "Caida", "hueco").await);

    let resp = app.post(&format!("/delete/{}", id), Some(&admin)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.listed_ids(&ana, "?solucionado=todos").await.is_empty());
}

#[tokio::test]
async fn delete_missing_report() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app.post("/delete/4242", Some(&cookie)).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Administration
// ===========================================================================

#[tokio::test]
async fn admin_updates_score() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let id = report_id(&app.create_report(&ana, "Ambiental", "").await);

    let resp = app
        .post_form(&format!("/update_score/{}", id), &[("score", "4")], Some(&admin))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["score"], 4);
}

#[tokio::test]
async fn admin_score_out_of_range_is_rejected() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let id = report_id(&app.create_report(&ana, "Caida", "").await);

    for score in ["7", "-1"] {
        let resp = app
            .post_form(&format!("/update_score/{}", id), &[("score", score)], Some(&admin))
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "score {}", score);
        assert_eq!(resp.error_message(), "score must be between 0 and 5");
    }

    let resp = app
        .post_form(&format!("/update_score/{}", id), &[("score", "alto")], Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "score must be an integer");

    let report = app.get(&format!("/report/{}", id), Some(&ana)).await.json();
    assert_eq!(report["score"], 3);
}

#[tokio::test]
async fn admin_score_without_field_is_json_error() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let id = report_id(&app.create_report(&ana, "Caida", "").await);

    let resp = app
        .post_form(&format!("/update_score/{}", id), &[], Some(&admin))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.error_message().starts_with("invalid form"), "{}", resp.error_message());
}

#[tokio::test]
async fn non_numeric_report_id_is_json_error() {
    let app = app().await;
    let cookie = app.login("ana").await;

    let resp = app.get("/report/abc", Some(&cookie)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.error_message().starts_with("invalid path"), "{}", resp.error_message());
}

#[tokio::test]
async fn admin_score_reorders_listing() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let low = report_id(&app.create_report(&ana, "Ambiental", "").await);
    let high = report_id(&app.create_report(&ana, "Incendio", "").await);

    app.set_score(&admin, low, 5).await;
    app.set_score(&admin, high, 0).await;

    assert_eq!(app.listed_ids(&ana, "").await, vec![low, high]);
}

#[tokio::test]
async fn regular_user_cannot_moderate() {
    let app = app().await;
    let ana = app.login("ana").await;
    let id = report_id(&app.create_report(&ana, "Caida", "").await);

    let score = app
        .post_form(&format!("/update_score/{}", id), &[("score", "5")], Some(&ana))
        .await;
    assert_eq!(score.status, StatusCode::FORBIDDEN);

    let resolve = app.post(&format!("/mark_resolved/{}", id), Some(&ana)).await;
    assert_eq!(resolve.status, StatusCode::FORBIDDEN);

    let report = app.get(&format!("/report/{}", id), Some(&ana)).await.json();
    assert_eq!(report["score"], 3);
    assert_eq!(report["resolved"], false);
}

#[tokio::test]
async fn mark_resolved_is_idempotent() {
    let app = app().await;
    let ana = app.login("ana").await;
    let admin = app.login_admin().await;
    let id = report_id(&app.create_report(&ana, "Caida", "").await);

    for _ in 0..2 {
        let resp = app.post(&format!("/mark_resolved/{}", id), Some(&admin)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json()["resolved"], true);
    }

    let missing = app.post("/mark_resolved/777", Some(&admin)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
