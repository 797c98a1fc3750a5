use common::storage::ContentHash;
use serde_json::json;

use crate::common::{ELF, MAX_FILE_SIZE, PDF, TestApp, docx, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_then_duplicate_then_other_owner() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let bob = app.token_for("bob");

        let res = app.upload_with_token("report.pdf", PDF.to_vec(), &alice).await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();
        assert_eq!(res.body["name"], "report.pdf");
        assert_eq!(res.body["size"].as_u64().unwrap(), PDF.len() as u64);
        assert_eq!(res.body["mime"], "application/pdf");

        let res = app.upload_with_token("report.pdf", PDF.to_vec(), &alice).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["duplicate_of"].as_i64().unwrap(), id);

        let res = app.upload_with_token("report.pdf", PDF.to_vec(), &bob).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_ne!(res.id(), id);

        assert_eq!(app.stored_files(), 2);
    }

    #[tokio::test]
    async fn duplicate_under_another_name_is_still_a_duplicate() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let id = app.create_file("report.pdf", PDF, &alice).await;
        let res = app.upload_with_token("copy.PDF", PDF.to_vec(), &alice).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["duplicate_of"].as_i64().unwrap(), id);
        assert_eq!(app.stored_files(), 1);
    }

    #[tokio::test]
    async fn requires_identity() {
        let app = TestApp::spawn().await;

        let res = app.upload_without_token("report.pdf", PDF.to_vec()).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "unauthorized");

        let res = app
            .upload_with_token("report.pdf", PDF.to_vec(), "not-a-token")
            .await;
        assert_eq!(res.status, 401);

        assert_eq!(app.stored_files(), 0);
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let res = app.upload_with_token("setup.exe", PDF.to_vec(), &alice).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "extension_not_allowed");
        assert_eq!(app.stored_files(), 0);
        assert_eq!(app.staged_files(), 0);
    }

    #[tokio::test]
    async fn rejects_disallowed_content_behind_allowed_extension() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let res = app.upload_with_token("invoice.pdf", ELF.to_vec(), &alice).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "mime_not_allowed");
        assert!(res.body["mime"].as_str().is_some());
        assert_eq!(app.stored_files(), 0);
        assert_eq!(app.staged_files(), 0);
    }

    #[tokio::test]
    async fn rejects_oversize_file() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let content = vec![b'a'; MAX_FILE_SIZE as usize + 1];
        let res = app.upload_with_token("big.txt", content, &alice).await;

        assert_eq!(res.status, 413);
        assert_eq!(res.error_code(), "too_large");
        assert_eq!(app.stored_files(), 0);
        assert_eq!(app.staged_files(), 0);
    }

    #[tokio::test]
    async fn accepts_file_at_limit() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let content = vec![b'a'; MAX_FILE_SIZE as usize];
        let res = app.upload_with_token("exact.txt", content, &alice).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["mime"], "text/plain");
    }

    #[tokio::test]
    async fn missing_file_field_is_no_file() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let form = reqwest::multipart::Form::new().text("note", "no attachment here");
        let res = app.upload_form_with_token(form, &alice).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "no_file");

        let res = app
            .post_json(routes::FILES, &json!({"file": "report.pdf"}), &alice)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "no_file");
    }

    #[tokio::test]
    async fn blank_filename_is_empty_name() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let part = reqwest::multipart::Part::bytes(PDF.to_vec()).file_name("   ");
        let form = reqwest::multipart::Form::new().part("file", part);
        let res = app.upload_form_with_token(form, &alice).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "empty_name");
    }

    #[tokio::test]
    async fn file_part_without_filename_is_no_file() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let form = reqwest::multipart::Form::new().text("file", "plain text field");
        let res = app.upload_form_with_token(form, &alice).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "no_file");
        assert_eq!(app.stored_files(), 0);
    }

    #[tokio::test]
    async fn file_part_after_plain_field_of_same_name_is_stored() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");

        let part = reqwest::multipart::Part::bytes(PDF.to_vec()).file_name("scan.pdf");
        let form = reqwest::multipart::Form::new()
            .text("file", "plain text field")
            .part("file", part);
        let res = app.upload_form_with_token(form, &alice).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "scan.pdf");
    }

    #[tokio::test]
    async fn accepts_large_word_document() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let content = docx(40 * 1024);

        let res = app
            .upload_with_token("Informe anual.docx", content.clone(), &alice)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            res.body["mime"],
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(res.body["size"].as_u64().unwrap(), content.len() as u64);
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn content_matches_recorded_hash() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let content = b"fecha,cantidad\n2024-01-01,3\n".to_vec();

        let res = app
            .upload_with_token("pedido.csv", content.clone(), &alice)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();

        let res = app.download_with_token(id, &alice, None).await;
        assert_eq!(res.status(), 200);
        let headers = res.headers().clone();
        let bytes = res.bytes().await.unwrap();

        assert_eq!(bytes.as_ref(), content.as_slice());
        let hash = ContentHash::compute(&bytes).to_hex();
        assert_eq!(headers["etag"].to_str().unwrap(), format!("\"{hash}\""));
        assert_eq!(headers["content-type"], "text/plain");
        assert_eq!(headers["content-length"], content.len().to_string().as_str());
        let disposition = headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"), "{disposition}");
        assert!(disposition.contains("filename=\"pedido.csv\""), "{disposition}");
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let id = app.create_file("report.pdf", PDF, &alice).await;

        let etag = format!("\"{}\"", ContentHash::compute(PDF).to_hex());
        let res = app.download_with_token(id, &alice, Some(&etag)).await;
        assert_eq!(res.status(), 304);

        let res = app.download_with_token(id, &alice, Some("\"stale\"")).await;
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn unicode_name_is_encoded_in_disposition() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let id = app.create_file("año fiscal.pdf", PDF, &alice).await;

        let res = app.download_with_token(id, &alice, None).await;
        let disposition = res.headers()["content-disposition"].to_str().unwrap();
        assert!(disposition.contains("filename*=UTF-8''a%C3%B1o%20fiscal.pdf"), "{disposition}");
    }

    #[tokio::test]
    async fn other_owner_is_forbidden_and_unknown_id_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let bob = app.token_for("bob");
        let id = app.create_file("report.pdf", PDF, &alice).await;

        let res = app.get_with_token(&routes::file(id), &bob).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.error_code(), "forbidden");

        let res = app.get_with_token(&routes::file(id + 1000), &bob).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.error_code(), "not_found");

        let res = app.get_without_token(&routes::file(id)).await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn cookie_credentials_are_accepted() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let id = app.create_file("report.pdf", PDF, &alice).await;

        for cookie in [format!("spm_token={alice}"), format!("access_token={alice}")] {
            let res = app.get_with_cookie(&routes::file(id), &cookie).await;
            assert_eq!(res.status, 200, "{cookie}");
        }
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_file() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let id = app.create_file("report.pdf", PDF, &alice).await;
        assert_eq!(app.stored_files(), 1);

        let res = app.delete_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        assert_eq!(app.stored_files(), 0);

        let res = app.get_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(res.body["meta"]["total"], 0);
        assert!(res.body["items"].as_array().unwrap().is_empty());

        let res = app.delete_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn other_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let bob = app.token_for("bob");
        let id = app.create_file("report.pdf", PDF, &alice).await;

        let res = app.delete_with_token(&routes::file(id), &bob).await;
        assert_eq!(res.status, 403);
        assert_eq!(app.stored_files(), 1);

        let res = app.get_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn missing_stored_file_does_not_block_delete() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        let id = app.create_file("report.pdf", PDF, &alice).await;

        for entry in std::fs::read_dir(&app.upload_dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_file() {
                std::fs::remove_file(path).unwrap();
            }
        }

        let res = app.get_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 404);

        let res = app.delete_with_token(&routes::file(id), &alice).await;
        assert_eq!(res.status, 200);
    }
}

mod list {
    use super::*;

    async fn seeded_app() -> (TestApp, String) {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice");
        for i in 0..5 {
            let content = format!("pedido numero {i}\n");
            app.create_file(&format!("pedido_{i}.txt"), content.as_bytes(), &alice)
                .await;
        }
        app.create_file("Informe.pdf", PDF, &alice).await;

        let bob = app.token_for("bob");
        app.create_file("pedido_bob.txt", b"bob's order\n", &bob)
            .await;

        (app, alice)
    }

    #[tokio::test]
    async fn lists_only_own_files_with_defaults() {
        let (app, alice) = seeded_app().await;

        let res = app.get_with_token(routes::FILES, &alice).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let meta = &res.body["meta"];
        assert_eq!(meta["total"], 6);
        assert_eq!(meta["page"], 1);
        assert_eq!(meta["per_page"], 20);
        assert_eq!(meta["pages"], 1);
        assert_eq!(meta["sort"], "created_at");
        assert_eq!(meta["order"], "desc");
        assert!(meta["q"].is_null());

        let items = res.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|i| i["original_name"] != "pedido_bob.txt"));
        for key in ["id", "original_name", "size", "mime", "created_at"] {
            assert!(!items[0][key].is_null(), "missing {key}");
        }
    }

    #[tokio::test]
    async fn paginates_and_handles_out_of_range_pages() {
        let (app, alice) = seeded_app().await;

        let res = app
            .get_with_token(
                "/api/files?q=pedido&sort=original_name&order=asc&per_page=2&page=3",
                &alice,
            )
            .await;
        assert_eq!(res.body["meta"]["total"], 5);
        assert_eq!(res.body["meta"]["pages"], 3);
        let items = res.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["original_name"], "pedido_4.txt");

        let res = app
            .get_with_token("/api/files?per_page=2&page=40", &alice)
            .await;
        assert_eq!(res.status, 200);
        assert!(res.body["items"].as_array().unwrap().is_empty());
        assert_eq!(res.body["meta"]["total"], 6);
    }

    #[tokio::test]
    async fn search_matches_name_or_mime_case_insensitively() {
        let (app, alice) = seeded_app().await;

        let res = app.get_with_token("/api/files?q=INFORME", &alice).await;
        assert_eq!(res.body["meta"]["total"], 1);
        assert_eq!(res.body["meta"]["q"], "INFORME");

        let res = app.get_with_token("/api/files?q=text%2Fplain", &alice).await;
        assert_eq!(res.body["meta"]["total"], 5);
    }

    #[tokio::test]
    async fn unknown_sort_falls_back_to_created_at() {
        let (app, alice) = seeded_app().await;

        let res = app
            .get_with_token("/api/files?sort=id%3BDROP%20TABLE%20uploads&order=up", &alice)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["meta"]["sort"], "created_at");
        assert_eq!(res.body["meta"]["order"], "desc");
        assert_eq!(res.body["meta"]["total"], 6);
    }

    #[tokio::test]
    async fn requires_identity() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::FILES).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "unauthorized");
    }
}
