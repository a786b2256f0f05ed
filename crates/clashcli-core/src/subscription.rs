use crate::error::{Error, Result};
use reqwest::StatusCode;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// 下载超时
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// 下载订阅并写入 clash 配置文件，返回写入的字节数
///
/// 只有 200 视为成功；写入前会创建目标目录。
pub async fn update_subscription(url: &str, target: &Path) -> Result<usize> {
    let client = reqwest::Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::Download(status.as_u16()));
    }

    let body = response.bytes().await?;
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target, &body)?;
    info!("subscription written to {} ({} bytes)", target.display(), body.len());
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("clashcli-subscription-{}-{}", std::process::id(), name))
            .join("config.yaml")
    }

    #[tokio::test]
    async fn writes_body_on_success() {
        let mut server = Server::new_async().await;
        let _sub = server
            .mock("GET", "/sub")
            .with_status(200)
            .with_body("port: 7890\nmode: Rule\n")
            .create_async()
            .await;

        let target = scratch("ok");
        let written = update_subscription(&format!("{}/sub", server.url()), &target)
            .await
            .unwrap();
        assert_eq!(written, 22);
        assert_eq!(fs::read_to_string(&target).unwrap(), "port: 7890\nmode: Rule\n");
    }

    #[tokio::test]
    async fn non_200_fails_without_writing() {
        let mut server = Server::new_async().await;
        let _sub = server
            .mock("GET", "/sub")
            .with_status(403)
            .create_async()
            .await;

        let target = scratch("forbidden");
        let err = update_subscription(&format!("{}/sub", server.url()), &target)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download(403)));
        assert!(!target.exists());
    }
}
