use crate::config::toml_config::PortalConfig;
use crate::core::CourseSource;
use crate::domain::model::CourseQuery;
use crate::utils::error::{CleanError, Result};
use crate::utils::validation::Validate;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// 課程查詢每頁最後一筆的欄位，用來翻頁
const LAST_CONTROL_NUMBER: &str = "LASTCONTROLNUMBER";
const RETRIEVED_ROWS: &str = "RETRIEVEDROWS";

/// Client for the scheduling portal: login, bounded wait for the second
/// factor, then paged course-search queries returning raw JSON.
pub struct PortalClient {
    client: Client,
    base_url: Url,
    config: PortalConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| CleanError::InvalidConfigValueError {
            field: "portal.base_url".to_string(),
            value: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| CleanError::InvalidConfigValueError {
            field: "portal".to_string(),
            value: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// 送出帳號密碼，入口網站接著會發出第二因素驗證
    pub async fn login(&self) -> Result<()> {
        let login_url = self.endpoint(self.config.login_path())?;
        tracing::info!("🔐 Logging in at {}", login_url);

        // 先取得登入頁面的 session cookie
        let page = self.client.get(login_url.clone()).send().await?;
        tracing::debug!("Login page status: {}", page.status());

        let form = [
            ("j_username", self.config.username.as_str()),
            ("j_password", self.config.password.as_str()),
            ("_eventId_proceed", ""),
        ];
        let response = self.client.post(login_url).form(&form[..]).send().await?;

        if !response.status().is_success() {
            return Err(CleanError::FetchError {
                message: format!("login rejected with status {}", response.status()),
            });
        }

        tracing::info!("📨 Credentials accepted, waiting for second-factor confirmation");
        Ok(())
    }

    /// Polls the confirmation page until the session is authorized, bounded
    /// by the configured timeout.
    pub async fn await_confirmation(&self) -> Result<()> {
        let confirmation_url = self.endpoint(self.config.confirmation_path())?;
        let login_path = self.endpoint(self.config.login_path())?.path().to_string();
        let timeout = self.config.confirmation_timeout();
        let interval = self.config.poll_interval();

        let poll = async {
            let mut attempts = 0u32;
            loop {
                attempts += 1;
                match self.client.get(confirmation_url.clone()).send().await {
                    Ok(response)
                        if response.status().is_success()
                            && !response.url().path().starts_with(&login_path) =>
                    {
                        tracing::info!("✅ Session confirmed after {} attempt(s)", attempts);
                        return;
                    }
                    Ok(response) => {
                        tracing::debug!(
                            "Confirmation pending (status {}, at {})",
                            response.status(),
                            response.url()
                        );
                    }
                    Err(e) => tracing::debug!("Confirmation poll failed: {}", e),
                }
                tokio::time::sleep(interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| CleanError::FetchError {
                message: format!(
                    "second-factor confirmation not received within {}s",
                    timeout.as_secs()
                ),
            })
    }

    /// 單頁查詢，回傳該頁的學期記錄陣列
    pub async fn search_page(&self, query: &CourseQuery, last_control_number: u64) -> Result<Vec<Value>> {
        let search_url = self.endpoint(self.config.search_path())?;
        let params = query.to_params(last_control_number);

        tracing::debug!(
            "Querying {} (term {}, last-control-number {})",
            search_url,
            query.term_label(),
            last_control_number
        );
        let response = self.client.get(search_url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(CleanError::FetchError {
                message: format!("course search returned status {}", response.status()),
            });
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Array(terms)) => Ok(terms),
            Ok(other) => Err(CleanError::FetchError {
                message: format!("course search returned a non-array payload: {}", type_name(&other)),
            }),
            Err(e) => Err(CleanError::FetchError {
                message: format!("course search returned invalid JSON (session expired?): {}", e),
            }),
        }
    }

    /// Requests pages until a page retrieves no rows or `max_pages` is reached.
    pub async fn search(&self, query: &CourseQuery) -> Result<Vec<Value>> {
        let mut terms = Vec::new();
        let mut last_control_number = 0u64;

        for page in 1..=self.config.max_pages() {
            let page_terms = self.search_page(query, last_control_number).await?;
            let next = next_control_number(&page_terms);
            tracing::info!("📄 Page {}: {} term record(s)", page, page_terms.len());
            terms.extend(page_terms);

            match next {
                Some(next) if next != last_control_number => last_control_number = next,
                _ => break,
            }
        }

        Ok(terms)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 下一頁的 control number；該頁沒有資料時回傳 None
fn next_control_number(terms: &[Value]) -> Option<u64> {
    let last = terms.last()?;
    let rows = last.get(RETRIEVED_ROWS).and_then(as_u64)?;
    if rows == 0 {
        return None;
    }
    last.get(LAST_CONTROL_NUMBER).and_then(as_u64)
}

#[async_trait::async_trait]
impl CourseSource for PortalClient {
    async fn fetch(&self, query: &CourseQuery) -> Result<Vec<u8>> {
        self.login().await?;
        self.await_confirmation().await?;
        let terms = self.search(query).await?;
        Ok(serde_json::to_vec(&terms)?)
    }
}
