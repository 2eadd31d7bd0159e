use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::LoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse
{
        pub url: String,
        pub status: u16,
        pub body: Vec<u8>,
}

impl FetchResponse
{
        pub fn ok(
                url: &str,
                body: Vec<u8>,
        ) -> Self
        {
                Self {
                        url: url.to_string(),
                        status: 200,
                        body,
                }
        }

        pub fn is_success(&self) -> bool
        {
                (200..300).contains(&self.status)
        }

        /// The body, or [`LoadError::Http`] for a non-success status.
        pub fn into_body(self) -> Result<Vec<u8>, LoadError>
        {
                if self.is_success()
                {
                        Ok(self.body)
                }
                else
                {
                        Err(LoadError::Http {
                                url: self.url,
                                status: self.status,
                        })
                }
        }
}

/// Source of raw asset bytes.
pub trait Fetcher
{
        fn fetch(
                &self,
                url: &str,
        ) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>>;
}

/// Serves asset URLs from a directory on disk.
///
/// The configured URL prefix is stripped and the rest resolved under `root`;
/// a missing file answers with status 404 like a web server would.
#[derive(Debug, Clone)]
pub struct FileFetcher
{
        root: PathBuf,
        prefix: String,
}

impl FileFetcher
{
        pub fn new(
                root: impl Into<PathBuf>,
                prefix: impl Into<String>,
        ) -> Self
        {
                Self {
                        root: root.into(),
                        prefix: prefix.into(),
                }
        }

        pub fn root(&self) -> &Path
        {
                &self.root
        }

        pub fn resolve(
                &self,
                url: &str,
        ) -> PathBuf
        {
                let relative = url.strip_prefix(self.prefix.as_str()).unwrap_or(url);
                self.root.join(relative.trim_start_matches('/'))
        }
}

impl Fetcher for FileFetcher
{
        fn fetch(
                &self,
                url: &str,
        ) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>>
        {
                let path = self.resolve(url);
                let url = url.to_string();

                async move {
                        log::debug!("FileFetcher: {} -> {}", url, path.display());

                        match std::fs::read(&path)
                        {
                                Ok(body) => Ok(FetchResponse::ok(&url, body)),
                                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                                        url,
                                        status: 404,
                                        body: Vec::new(),
                                }),
                                Err(e) => Err(LoadError::io(&url, e)),
                        }
                }
                .boxed_local()
        }
}

/// Fetches relative to the page origin.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

#[cfg(target_arch = "wasm32")]
impl HttpFetcher
{
        fn format_url(url: &str) -> Result<reqwest::Url, LoadError>
        {
                let origin = web_sys::window()
                        .and_then(|window| window.location().origin().ok())
                        .ok_or_else(|| LoadError::io(url, "no window location"))?;

                let base = reqwest::Url::parse(&format!("{origin}/")).map_err(|e| LoadError::io(url, e))?;
                base.join(url).map_err(|e| LoadError::io(url, e))
        }
}

#[cfg(target_arch = "wasm32")]
impl Fetcher for HttpFetcher
{
        fn fetch(
                &self,
                url: &str,
        ) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>>
        {
                let url = url.to_string();

                async move {
                        let target = Self::format_url(&url)?;
                        let response = reqwest::get(target).await.map_err(|e| LoadError::io(&url, e))?;
                        let status = response.status().as_u16();
                        let body = response.bytes().await.map_err(|e| LoadError::io(&url, e))?.to_vec();

                        Ok(FetchResponse { url, status, body })
                }
                .boxed_local()
        }
}

/// The fetcher for the current target.
pub fn default_fetcher(config: &crate::config::Config) -> std::rc::Rc<dyn Fetcher>
{
        #[cfg(target_arch = "wasm32")]
        {
                let _ = config;
                std::rc::Rc::new(HttpFetcher)
        }

        #[cfg(not(target_arch = "wasm32"))]
        std::rc::Rc::new(FileFetcher::new(config.assets_root.clone(), config.assets_url.clone()))
}

#[cfg(test)]
pub(crate) mod tests
{
        use std::cell::{Cell, RefCell};
        use std::collections::HashMap;
        use futures::channel::oneshot;

        use super::*;

        /// In-memory fetcher whose responses can be held back and released.
        #[derive(Default)]
        pub struct StubFetcher
        {
                pub responses: RefCell<HashMap<String, FetchResponse>>,
                pub gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
                pub requests: Cell<usize>,
        }

        impl StubFetcher
        {
                pub fn with(
                        self,
                        url: &str,
                        body: &[u8],
                ) -> Self
                {
                        self.responses.borrow_mut().insert(url.to_string(), FetchResponse::ok(url, body.to_vec()));
                        self
                }

                /// Holds the response for `url` until the returned sender fires.
                pub fn gate(
                        &self,
                        url: &str,
                ) -> oneshot::Sender<()>
                {
                        let (tx, rx) = oneshot::channel();
                        self.gates.borrow_mut().insert(url.to_string(), rx);
                        tx
                }
        }

        impl Fetcher for StubFetcher
        {
                fn fetch(
                        &self,
                        url: &str,
                ) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>>
                {
                        self.requests.set(self.requests.get() + 1);

                        let response = self.responses.borrow().get(url).cloned().unwrap_or(FetchResponse {
                                url: url.to_string(),
                                status: 404,
                                body: Vec::new(),
                        });
                        let gate = self.gates.borrow_mut().remove(url);

                        async move {
                                if let Some(gate) = gate
                                {
                                        let _ = gate.await;
                                }
                                Ok(response)
                        }
                        .boxed_local()
                }
        }

        #[test]
        fn non_success_status_becomes_an_error()
        {
                let response = FetchResponse {
                        url: "/data.json".into(),
                        status: 500,
                        body: b"oops".to_vec(),
                };

                assert_eq!(
                        response.into_body(),
                        Err(LoadError::Http {
                                url: "/data.json".into(),
                                status: 500,
                        })
                );
        }

        #[test]
        fn file_fetcher_strips_the_assets_prefix()
        {
                let fetcher = FileFetcher::new("public", "/static/");

                assert_eq!(fetcher.resolve("/static/images/a.jpg"), PathBuf::from("public/images/a.jpg"));
                assert_eq!(fetcher.resolve("images/b.jpg"), PathBuf::from("public/images/b.jpg"));
        }

        #[test]
        fn file_fetcher_reports_missing_files_as_404()
        {
                let fetcher = FileFetcher::new(std::env::temp_dir(), "/");

                let response = futures::executor::block_on(fetcher.fetch("/orbis-definitely-missing.bin")).unwrap();

                assert_eq!(response.status, 404);
                assert!(!response.is_success());
        }
}
