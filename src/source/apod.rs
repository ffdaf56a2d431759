// apod.rs — NASA APOD API 异步客户端
// 负责与 APOD 接口交互：查询某天的元数据并下载图片

use super::{MediaType, PictureRecord, PictureSource};
use crate::error::ApodError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

/// APOD 接口的默认地址
pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov";

/// NASA 提供的公共演示 Key，有较低的频率限制
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// APOD 接口返回的 JSON
///
/// 只提取需要的字段，其余字段由 serde 忽略
#[derive(Deserialize, Debug)]
struct ApodResponse {
    media_type: String,
    /// 普通分辨率图片（视频时是视频地址）
    #[serde(default)]
    url: Option<String>,
    /// 高清图片，不一定有
    #[serde(default)]
    hdurl: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    copyright: Option<String>,
}

/// APOD 客户端
///
/// `reqwest::Client` 内部维护连接池，整个程序复用同一个实例
pub struct ApodClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApodClient {
    /// `base_url` 通常是 DEFAULT_BASE_URL，测试时指向本地的模拟服务
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// 下载图片原始字节
    async fn download(&self, url: &str) -> Result<Vec<u8>, ApodError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PictureSource for ApodClient {
    async fn fetch_picture(&self, date: NaiveDate) -> Result<PictureRecord, ApodError> {
        let url = format!("{}/planetary/apod", self.base_url.trim_end_matches('/'));
        let date_str = date.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("date", date_str.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let meta: ApodResponse = response.json().await?;

        let media_type = MediaType::parse(&meta.media_type);
        if media_type != MediaType::Image {
            return Err(ApodError::NotAnImage {
                date,
                media_type: meta.media_type,
            });
        }

        // 有高清图就用高清图
        let image_url = meta
            .hdurl
            .or(meta.url)
            .ok_or_else(|| ApodError::Transport(format!("no image url in response for {date_str}")))?;

        let image_bytes = self.download(&image_url).await?;

        Ok(PictureRecord {
            date,
            title: meta.title,
            caption: meta.explanation,
            image_bytes,
            media_type,
            image_url,
            copyright: meta
                .copyright
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 极简的 HTTP 模拟服务：按路径返回固定响应，并记录收到的请求行
    pub(crate) struct MockServer {
        pub base: String,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockServer {
        /// `routes` 的内容可以引用 `base`，所以由闭包在拿到端口后构造
        pub(crate) async fn start<F>(routes: F) -> Self
        where
            F: FnOnce(&str) -> Vec<(&'static str, u16, Vec<u8>)>,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let routes: HashMap<&'static str, (u16, Vec<u8>)> = routes(&base)
                .into_iter()
                .map(|(path, status, body)| (path, (status, body)))
                .collect();
            let routes = Arc::new(routes);
            let requests = Arc::new(Mutex::new(Vec::new()));

            let log = Arc::clone(&requests);
            tokio::spawn(async move {
                loop {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        break;
                    };
                    let routes = Arc::clone(&routes);
                    let log = Arc::clone(&log);
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            let n = stream.read(&mut chunk).await.unwrap_or(0);
                            if n == 0 {
                                break;
                            }
                            buf.extend_from_slice(&chunk[..n]);
                        }
                        let head = String::from_utf8_lossy(&buf).to_string();
                        let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                        log.lock().unwrap().push(target.clone());

                        let path = target.split('?').next().unwrap_or("/");
                        let (status, body) = routes
                            .get(path)
                            .cloned()
                            .unwrap_or((404, b"not found".to_vec()));
                        let header = format!(
                            "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = stream.write_all(header.as_bytes()).await;
                        let _ = stream.write_all(&body).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });

            Self { base, requests }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn fetches_image_record() {
        let server = MockServer::start(|base| {
            let meta = format!(
                r#"{{"media_type":"image","url":"{base}/img.jpg","title":"T","explanation":"C"}}"#
            );
            vec![
                ("/planetary/apod", 200, meta.into_bytes()),
                ("/img.jpg", 200, b"jpeg-bytes".to_vec()),
            ]
        })
        .await;

        let client = ApodClient::new(&server.base, "KEY".to_string());
        let record = client.fetch_picture(date()).await.unwrap();

        assert_eq!(record.title, "T");
        assert_eq!(record.caption, "C");
        assert_eq!(record.image_bytes, b"jpeg-bytes");
        assert_eq!(record.media_type, MediaType::Image);
        assert_eq!(record.date, date());
        assert_eq!(record.copyright, None);

        let requests = server.requests.lock().unwrap().clone();
        assert!(requests[0].contains("date=2025-06-01"), "{requests:?}");
        assert!(requests[0].contains("api_key=KEY"), "{requests:?}");
    }

    #[tokio::test]
    async fn prefers_hd_url() {
        let server = MockServer::start(|base| {
            let meta = format!(
                r#"{{"media_type":"image","url":"{base}/small.jpg","hdurl":"{base}/big.jpg","title":"T","explanation":"C","copyright":"\nJane Doe\n"}}"#
            );
            vec![
                ("/planetary/apod", 200, meta.into_bytes()),
                ("/small.jpg", 200, b"small".to_vec()),
                ("/big.jpg", 200, b"big".to_vec()),
            ]
        })
        .await;

        let client = ApodClient::new(&server.base, "KEY".to_string());
        let record = client.fetch_picture(date()).await.unwrap();

        assert_eq!(record.image_bytes, b"big");
        assert!(record.image_url.ends_with("/big.jpg"));
        assert_eq!(record.copyright.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn video_is_not_an_image() {
        let server = MockServer::start(|_| {
            let meta = r#"{"media_type":"video","url":"https://www.youtube.com/embed/x","title":"V","explanation":"C"}"#;
            vec![("/planetary/apod", 200, meta.as_bytes().to_vec())]
        })
        .await;

        let client = ApodClient::new(&server.base, "KEY".to_string());
        let err = client.fetch_picture(date()).await.unwrap_err();

        match err {
            ApodError::NotAnImage { date: d, media_type } => {
                assert_eq!(d, date());
                assert_eq!(media_type, "video");
            }
            other => panic!("expected NotAnImage, got {other:?}"),
        }
        // 视频不应触发任何下载
        assert_eq!(server.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn error_status_is_transport_error() {
        let server = MockServer::start(|_| {
            vec![("/planetary/apod", 400, br#"{"msg":"Date must be between Jun 16, 1995 and today."}"#.to_vec())]
        })
        .await;

        let client = ApodClient::new(&server.base, "KEY".to_string());
        let err = client.fetch_picture(date()).await.unwrap_err();
        assert!(matches!(err, ApodError::Transport(ref msg) if msg.contains("400")), "{err:?}");
    }

    #[tokio::test]
    async fn failed_image_download_is_transport_error() {
        let server = MockServer::start(|base| {
            let meta = format!(
                r#"{{"media_type":"image","url":"{base}/missing.jpg","title":"T","explanation":"C"}}"#
            );
            vec![("/planetary/apod", 200, meta.into_bytes())]
        })
        .await;

        let client = ApodClient::new(&server.base, "KEY".to_string());
        let err = client.fetch_picture(date()).await.unwrap_err();
        assert!(matches!(err, ApodError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        // 绑定后立即释放端口，请求必然连接失败
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = ApodClient::new(base, "KEY".to_string());
        let err = client.fetch_picture(date()).await.unwrap_err();
        assert!(matches!(err, ApodError::Transport(_)), "{err:?}");
    }
}
