//! 音乐服务曲库适配器
//!
//! 每个外部服务一个客户端，统一实现 MusicCatalogPort

mod apple_music_client;
mod fake_catalog_client;
mod spotify_client;
mod youtube_music_client;

pub use apple_music_client::{AppleMusicClient, AppleMusicClientConfig};
pub use fake_catalog_client::FakeCatalogClient;
pub use spotify_client::{SpotifyClient, SpotifyClientConfig};
pub use youtube_music_client::{YoutubeMusicClient, YoutubeMusicClientConfig};

use reqwest::{Response, StatusCode};

use crate::application::ports::CatalogError;

/// 按标题猜测是否纯音乐
///
/// 外部曲库大多不标注 instrumental，标题含关键词时标 Some(true)，
/// 否则保持未知（None），由选曲器决定取舍。
pub(crate) fn infer_instrumental(title: &str) -> Option<bool> {
    let lower = title.to_lowercase();
    if lower.contains("instrumental") || lower.contains("karaoke version") {
        Some(true)
    } else {
        None
    }
}

/// 统一的 HTTP 状态码 → CatalogError 映射
pub(crate) async fn error_from_response(response: Response) -> CatalogError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited { retry_after_secs },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CatalogError::Unauthorized(format!("HTTP {}: {}", status, body))
        }
        StatusCode::NOT_FOUND => CatalogError::NotFound(body),
        _ => CatalogError::ServiceError(format!("HTTP {}: {}", status, body)),
    }
}

/// reqwest 错误 → CatalogError
pub(crate) fn error_from_reqwest(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else if e.is_connect() {
        CatalogError::NetworkError(format!("Cannot connect: {}", e))
    } else {
        CatalogError::NetworkError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_instrumental() {
        assert_eq!(infer_instrumental("Nuvole Bianche (Instrumental)"), Some(true));
        assert_eq!(infer_instrumental("Yellow - Karaoke Version"), Some(true));
        assert_eq!(infer_instrumental("Yellow"), None);
    }
}
