use actix_multipart::{Field, Multipart};
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::templates::{escape_html, render, Context, Page};
use super::upload::{drain, sanitize_filename, save_field};
use crate::config::SiteConfig;

/// Text fields larger than this are truncated.
const MAX_TEXT_FIELD: usize = 16 * 1024;

fn page(page: Page, context: Context) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render(page, context))
}

pub async fn home() -> HttpResponse {
    page(Page::Main, Context::new())
}

pub async fn about() -> HttpResponse {
    page(Page::About, Context::new())
}

pub async fn contact() -> HttpResponse {
    page(Page::Contact, Context::new())
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub nama: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pesan: Option<String>,
}

pub async fn contact_submit(form: web::Form<ContactForm>) -> HttpResponse {
    let form = form.into_inner();
    info!(
        nama = form.nama.as_deref().unwrap_or("-"),
        email = form.email.as_deref().unwrap_or("-"),
        pesan_len = form.pesan.as_deref().map_or(0, str::len),
        "contact message received"
    );

    let name = form.nama.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or("Anda");
    let notice = format!(
        "    <p class=\"notice\">Terima kasih, {}. Pesan Anda sudah kami terima.</p>",
        escape_html(name)
    );
    page(Page::Contact, Context::new().html("notice", notice))
}

pub async fn pmb() -> HttpResponse {
    page(Page::Pmb, Context::new())
}

/// A PMB registration as submitted. `foto_filename` is the sanitized name of
/// the stored photo, unset when no usable file was sent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PmbSubmission {
    pub nama: String,
    pub alamat: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub asal_sma: String,
    pub jurusan: String,
    pub foto_filename: Option<String>,
}

impl PmbSubmission {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "nama" => &mut self.nama,
            "alamat" => &mut self.alamat,
            "tempat_lahir" => &mut self.tempat_lahir,
            "tanggal_lahir" => &mut self.tanggal_lahir,
            "asal_sma" => &mut self.asal_sma,
            "jurusan" => &mut self.jurusan,
            _ => return,
        };
        *slot = value;
    }

    fn summary_html(&self) -> String {
        let rows = [
            ("Nama", self.nama.as_str()),
            ("Alamat", self.alamat.as_str()),
            ("Tempat lahir", self.tempat_lahir.as_str()),
            ("Tanggal lahir", self.tanggal_lahir.as_str()),
            ("Asal SMA", self.asal_sma.as_str()),
            ("Jurusan", self.jurusan.as_str()),
            ("Foto", self.foto_filename.as_deref().unwrap_or("tidak diunggah")),
        ];
        let items: String = rows
            .iter()
            .map(|(label, value)| format!("      <li>{label}: {}</li>\n", escape_html(value)))
            .collect();
        format!("    <ul class=\"summary\">\n{items}    </ul>\n")
    }
}

pub async fn pmb_submit(config: web::Data<SiteConfig>, mut payload: Multipart) -> HttpResponse {
    let submission_id = Uuid::new_v4();
    let mut submission = PmbSubmission::default();
    let mut problems: Vec<String> = Vec::new();
    let mut dimensions = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(err) => {
                warn!(%submission_id, error = %err, "unreadable PMB form");
                problems.push(format!("Formulir tidak dapat dibaca: {err}"));
                break;
            }
        };

        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        if name != "foto" {
            let value = read_text(&mut field).await;
            submission.set(&name, value);
            continue;
        }

        let safe_name = filename.as_deref().map(sanitize_filename).unwrap_or_default();
        if safe_name.is_empty() {
            drain(&mut field).await;
            continue;
        }

        match save_field(&config.upload_dir, &safe_name, field).await {
            Ok(path) => {
                dimensions = web::block(move || image::image_dimensions(&path))
                    .await
                    .ok()
                    .and_then(Result::ok);
                submission.foto_filename = Some(safe_name);
            }
            Err(err) => {
                warn!(%submission_id, file = %safe_name, error = %err, "failed to save PMB photo");
                problems.push(format!("Gagal menyimpan foto: {err}"));
            }
        }
    }

    info!(
        %submission_id,
        nama = %submission.nama,
        jurusan = %submission.jurusan,
        foto = submission.foto_filename.as_deref().unwrap_or("-"),
        dimensions = ?dimensions,
        "PMB submission received"
    );

    let mut notice = String::new();
    for problem in &problems {
        notice.push_str(&format!(
            "    <p class=\"error\">{}</p>\n",
            escape_html(problem)
        ));
    }
    if problems.is_empty() {
        notice.push_str("    <p class=\"notice\">Pendaftaran berhasil dikirim.</p>\n");
    }
    notice.push_str(&submission.summary_html());

    page(Page::Pmb, Context::new().html("notice", notice))
}

async fn read_text(field: &mut Field) -> String {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        match chunk {
            Ok(bytes) => {
                let room = MAX_TEXT_FIELD.saturating_sub(buf.len());
                buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
            }
            Err(err) => {
                warn!(error = %err, "truncated form field");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}
