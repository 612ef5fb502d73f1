use std::fs;
use std::path::Path;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};

use ds_model_web::config::SiteConfig;
use ds_model_web::site;

const BOUNDARY: &str = "----pmbformboundary";

fn site_config(upload_dir: &Path) -> SiteConfig {
    SiteConfig {
        upload_dir: upload_dir.to_path_buf(),
        ..SiteConfig::default()
    }
}

macro_rules! app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config))
                .configure(site::configure),
        )
        .await
    };
}

/// Builds a multipart body from text fields and an optional `foto` part.
fn multipart_body(fields: &[(&str, &str)], foto: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = foto {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"foto\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn pmb_request(body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/pmb")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

fn student_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nama", "Budi Santoso"),
        ("alamat", "Jl. Merdeka 1"),
        ("tempat_lahir", "Bandung"),
        ("tanggal_lahir", "2005-04-01"),
        ("asal_sma", "SMA 3"),
        ("jurusan", "Informatika"),
    ]
}

#[actix_rt::test]
async fn static_pages_render_with_titles() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(site_config(dir.path()));

    for (uri, title) in [
        ("/", "Home"),
        ("/home", "Home"),
        ("/about", "About"),
        ("/contact", "Contact"),
        ("/pmb", "PMB"),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let body = test::read_body(resp).await;
        let html = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(html.contains(&format!("<title>{title}</title>")), "{uri}");
    }
}

#[actix_rt::test]
async fn unknown_path_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(site_config(dir.path()));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn contact_post_confirms_and_escapes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(site_config(dir.path()));
    let req = test::TestRequest::post()
        .uri("/contact")
        .set_form(&[("nama", "<i>Sari</i>"), ("email", "sari@example.com"), ("pesan", "Halo")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(html.contains("Terima kasih, &lt;i&gt;Sari&lt;/i&gt;."));
}

#[actix_rt::test]
async fn pmb_upload_is_saved_under_sanitized_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let uploads = dir.path().join("uploads");
    let app = app!(site_config(&uploads));

    let body = multipart_body(&student_fields(), Some(("../pas foto.png", b"not really a png")));
    let resp = test::call_service(&app, pmb_request(body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(html.contains("Pendaftaran berhasil dikirim."));
    assert!(html.contains("Nama: Budi Santoso"));
    assert!(html.contains("Foto: pas_foto.png"));

    let stored = uploads.join("pas_foto.png");
    assert_eq!(fs::read(&stored).expect("stored file"), b"not really a png");
    let leftovers: Vec<_> = fs::read_dir(&uploads)
        .expect("uploads dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name() != "pas_foto.png")
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind: {leftovers:?}");
}

#[actix_rt::test]
async fn pmb_empty_filename_stores_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let uploads = dir.path().join("uploads");
    let app = app!(site_config(&uploads));

    let body = multipart_body(&student_fields(), Some(("", b"")));
    let resp = test::call_service(&app, pmb_request(body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(html.contains("Pendaftaran berhasil dikirim."));
    assert!(html.contains("Foto: tidak diunggah"));
    assert!(!uploads.exists());
}

#[actix_rt::test]
async fn pmb_without_file_part() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(site_config(dir.path()));

    let body = multipart_body(&[("nama", "Ani"), ("jurusan", "Biologi")], None);
    let resp = test::call_service(&app, pmb_request(body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(html.contains("Jurusan: Biologi"));
    assert!(html.contains("Foto: tidak diunggah"));
}

#[actix_rt::test]
async fn pmb_save_failure_is_rendered_not_raised() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A regular file where the upload directory should be.
    let blocked = dir.path().join("uploads");
    fs::write(&blocked, b"in the way").expect("write blocker");
    let app = app!(site_config(&blocked));

    let body = multipart_body(&student_fields(), Some(("foto.jpg", b"\xff\xd8\xff")));
    let resp = test::call_service(&app, pmb_request(body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(html.contains("Gagal menyimpan foto"));
    assert!(html.contains("Foto: tidak diunggah"));
    assert!(!html.contains("Pendaftaran berhasil dikirim."));
}
