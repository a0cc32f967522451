//! On-disk cache of profile-link QR images, one PNG per formatted ID.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::QrCode;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ParticipantRow;

const MODULE_PIXELS: u32 = 10;

#[derive(Debug, Clone)]
pub struct QrCache {
    dir: PathBuf,
    base_url: String,
}

impl QrCache {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(participant_id: &str) -> String {
        let safe: String = participant_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}.png", safe)
    }

    pub fn path_for(&self, participant_id: &str) -> PathBuf {
        self.dir.join(Self::file_name(participant_id))
    }

    /// Public path the cached image is served under.
    pub fn public_src(participant_id: &str) -> String {
        format!("/qr_codes/{}", Self::file_name(participant_id))
    }

    pub fn profile_url(&self, qr_code: &str) -> String {
        format!("{}/pilot/{}", self.base_url, qr_code)
    }

    /// Renders the QR image unless it is already cached; returns its path.
    pub async fn ensure(&self, participant: &ParticipantRow) -> Result<PathBuf> {
        let path = self.path_for(&participant.participant_id);
        if tokio::fs::try_exists(&path).await? {
            return Ok(path);
        }

        let url = self.profile_url(&participant.qr_code);
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_png(&dir, &target, &url)).await??;

        info!(
            "🔳 QR code generated for {} at {}",
            participant.participant_id,
            path.display()
        );
        Ok(path)
    }

    pub async fn data_uri(&self, participant: &ParticipantRow) -> Result<String> {
        let path = self.ensure(participant).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(bytes)
        ))
    }

    pub async fn remove(&self, participant_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(participant_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort variant for callers where a missing image must not fail the request.
    pub async fn ensure_logged(&self, participant: &ParticipantRow) {
        if let Err(e) = self.ensure(participant).await {
            warn!(
                "QR generation failed for {}: {}",
                participant.participant_id, e
            );
        }
    }
}

pub fn render_png(url: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let code = QrCode::new(url.as_bytes())?;
    Ok(code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .dark_color(Luma([0u8]))
        .light_color(Luma([255u8]))
        .build())
}

fn write_png(dir: &Path, target: &Path, url: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let image = render_png(url)?;
    // Write then rename so readers never see a partial file. Each writer gets its own
    // temp name; a concurrent render of the same member just replaces the target.
    let tmp = target.with_extension(format!("{}.png.tmp", Uuid::new_v4().simple()));
    image.save_with_format(&tmp, ImageFormat::Png)?;
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn participant(participant_id: &str) -> ParticipantRow {
        ParticipantRow {
            id: 1,
            participant_id: participant_id.to_string(),
            callsign: "Орел".to_string(),
            photo_url: "default-pilot.svg".to_string(),
            category: "pilot".to_string(),
            subcategory: Some("strike".to_string()),
            join_date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            points: 0,
            qr_code: "5f0c6a4e-7c1b-4c47-9a55-0c0e6d1f2a10".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn file_names_are_keyed_by_formatted_id() {
        assert_eq!(QrCache::file_name("UAV-0001"), "UAV-0001.png");
        assert_eq!(QrCache::file_name("../etc"), "___etc.png");
        assert_eq!(QrCache::public_src("UAV-0001"), "/qr_codes/UAV-0001.png");
    }

    #[test]
    fn profile_url_joins_base_without_double_slash() {
        let cache = QrCache::new("qr", "https://uav.example.org/");
        assert_eq!(
            cache.profile_url("abc"),
            "https://uav.example.org/pilot/abc"
        );
    }

    #[test]
    fn rendered_image_is_square_black_and_white() {
        let image = render_png("http://localhost:5000/pilot/abc").unwrap();
        assert_eq!(image.width(), image.height());
        assert_eq!(image.width() % MODULE_PIXELS, 0);
        assert!(image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_renders_of_one_member_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = std::sync::Arc::new(QrCache::new(dir.path(), "http://localhost:5000"));
        let p = participant("UAV-0003");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let p = p.clone();
                tokio::spawn(async move { cache.ensure(&p).await })
            })
            .collect();
        for handle in handles {
            let path = handle.await.unwrap().unwrap();
            assert!(path.ends_with("UAV-0003.png"));
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(leftovers, vec!["UAV-0003.png".to_string()]);
    }

    #[tokio::test]
    async fn ensure_writes_once_and_remove_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let cache = QrCache::new(dir.path().join("qr_codes"), "http://localhost:5000");
        let p = participant("UAV-0001");

        let path = cache.ensure(&p).await.unwrap();
        assert!(path.ends_with("UAV-0001.png"));
        let first = std::fs::metadata(&path).unwrap().modified().unwrap();

        let again = cache.ensure(&p).await.unwrap();
        assert_eq!(path, again);
        assert_eq!(std::fs::metadata(&again).unwrap().modified().unwrap(), first);

        let uri = cache.data_uri(&p).await.unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        cache.remove("UAV-0001").await.unwrap();
        assert!(!path.exists());
        cache.remove("UAV-0001").await.unwrap();
    }
}
