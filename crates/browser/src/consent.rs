use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    chromiumoxide::{Browser, BrowserConfig, Page},
    futures::StreamExt,
    tokio::time::{Instant, sleep, timeout},
    tracing::{debug, info, warn},
};

use swivel_oauth::flow::{ConsentDriver, ConsentOutcome};

use crate::extract;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(60);
const CONSENT_WAIT_PER_LABEL: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Labels tried in priority order for the consent control.
const APPROVE_LABELS: &[&str] = &["Allow", "Approve", "Accept", "Authorize", "Continue"];

/// Element hints scanned first for an on-page code.
const CODE_SELECTORS: &[&str] = &[
    "code",
    "pre",
    "input[readonly]",
    ".code",
    "[data-code]",
    "textarea",
];

/// Launch a headed Chrome session bound to one account's profile.
///
/// Automation-detection flags are disabled because the authorize page
/// may behave differently for automation-flagged clients.
async fn launch_profile_session(
    chrome: &Path,
    user_data_dir: &Path,
) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
    let config = BrowserConfig::builder()
        .chrome_executable(chrome)
        .user_data_dir(user_data_dir)
        .with_head()
        .window_size(1280, 800)
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("failed to launch Chrome")?;

    let handler_task = tokio::spawn(async move {
        while handler.next().await.is_some() {}
    });

    Ok((browser, handler_task))
}

/// Chromium-backed consent driver bound to one account's profile.
///
/// The session is held exclusively for one navigate + consent +
/// extract window and released on every exit path.
pub struct ChromiumConsentDriver {
    chrome: PathBuf,
    user_data_dir: PathBuf,
    callback_pattern: String,
}

impl ChromiumConsentDriver {
    pub fn new(
        chrome: PathBuf,
        user_data_dir: PathBuf,
        callback_pattern: impl Into<String>,
    ) -> Self {
        Self {
            chrome,
            user_data_dir,
            callback_pattern: callback_pattern.into(),
        }
    }

    async fn drive(&self, browser: &Browser, authorize_url: &str) -> Result<ConsentOutcome> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        debug!(url = %authorize_url, "navigating to authorize URL");
        match timeout(NAVIGATION_TIMEOUT, page.goto(authorize_url)).await {
            Ok(Ok(_)) => {},
            Ok(Err(e)) => {
                warn!(%e, "authorize navigation failed");
                return Ok(ConsentOutcome::NavigationTimeout);
            },
            Err(_) => {
                warn!("authorize navigation timed out");
                return Ok(ConsentOutcome::NavigationTimeout);
            },
        }

        if self.click_consent(&page).await {
            debug!("consent control clicked");
        } else {
            // The account may be pre-approved and redirect without a click.
            debug!("no consent control found, waiting for the redirect anyway");
        }

        if !self.wait_for_callback(&page).await {
            warn!("timed out waiting for the OAuth redirect");
            return Ok(ConsentOutcome::RedirectTimeout);
        }
        // Let the callback page finish rendering its code display.
        sleep(SETTLE_DELAY).await;

        match self.extract_code(&page).await {
            Some(raw) => Ok(ConsentOutcome::Code(raw)),
            None => Ok(ConsentOutcome::NoCode),
        }
    }

    /// Try each approval label in priority order, polling briefly for
    /// each. Absence of all of them is not fatal.
    async fn click_consent(&self, page: &Page) -> bool {
        for label in APPROVE_LABELS {
            let deadline = Instant::now() + CONSENT_WAIT_PER_LABEL;
            while Instant::now() < deadline {
                match click_button_with_text(page, label).await {
                    Ok(true) => {
                        info!(label, "clicked approval button");
                        return true;
                    },
                    Ok(false) => {},
                    Err(e) => debug!(%e, label, "consent probe failed"),
                }
                sleep(POLL_INTERVAL).await;
            }
        }
        false
    }

    /// Poll the page location until it matches the callback pattern.
    async fn wait_for_callback(&self, page: &Page) -> bool {
        let deadline = Instant::now() + REDIRECT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(url)) = page.url().await
                && url.contains(&self.callback_pattern)
            {
                debug!(%url, "redirect target reached");
                return true;
            }
            sleep(POLL_INTERVAL).await;
        }
        false
    }

    /// The extraction cascade: display elements, then body text, then
    /// the location itself. First plausible candidate wins.
    async fn extract_code(&self, page: &Page) -> Option<String> {
        if let Some(candidate) = element_candidate(page).await {
            debug!("authorization code found in a page element");
            return Some(candidate);
        }

        if let Ok(result) = page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            && let Ok(body) = result.into_value::<String>()
            && let Some(token) = extract::find_code_token(&body)
        {
            debug!("authorization code found in body text");
            return Some(token);
        }

        if let Ok(Some(href)) = page.url().await
            && let Some(code) = extract::code_from_location(&href)
        {
            debug!("authorization code reconstructed from the redirect URL");
            return Some(code);
        }

        None
    }
}

#[async_trait]
impl ConsentDriver for ChromiumConsentDriver {
    async fn complete_consent(&self, authorize_url: &str) -> Result<ConsentOutcome> {
        let (mut browser, handler) =
            launch_profile_session(&self.chrome, &self.user_data_dir).await?;

        let outcome = self.drive(&browser, authorize_url).await;

        // The session is released on every exit path before reporting back.
        if let Err(e) = browser.close().await {
            warn!(%e, "failed to close browser session");
        }
        handler.abort();

        match outcome {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(%e, "consent interaction failed");
                Ok(ConsentOutcome::NoCode)
            },
        }
    }
}

/// Click the first button-like element whose text contains `label`.
/// CSS selectors alone cannot match on text, so this goes through JS.
async fn click_button_with_text(page: &Page, label: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const buttons = document.querySelectorAll('button, [role="button"], input[type="submit"]');
            for (const el of buttons) {{
                const text = (el.innerText || el.value || '').trim();
                if (text.includes('{label}')) {{ el.click(); return true; }}
            }}
            return false;
        }})()"#
    );
    let result = page.evaluate(js).await?;
    Ok(result.into_value::<bool>().unwrap_or(false))
}

/// Scan the likely display elements for a non-trivial value or text.
async fn element_candidate(page: &Page) -> Option<String> {
    let selectors = serde_json::to_string(CODE_SELECTORS).ok()?;
    let js = format!(
        r#"(() => {{
            for (const sel of {selectors}) {{
                const el = document.querySelector(sel);
                if (!el) continue;
                const candidate = (el.value || el.textContent || '').trim();
                if (candidate.length > {min}) return candidate;
            }}
            return null;
        }})()"#,
        min = extract::MIN_CANDIDATE_LEN,
    );
    let result = page.evaluate(js).await.ok()?;
    result.into_value::<Option<String>>().ok().flatten()
}

/// Launch a headed session on `start_url` and block until the operator
/// closes the browser window.
///
/// Used by profile setup: the operator signs in by hand, the session
/// state lands in the profile dir, and closing the window is the
/// completion signal.
pub async fn interactive_session(
    chrome: &Path,
    user_data_dir: &Path,
    start_url: &str,
) -> Result<()> {
    let (browser, handler) = launch_profile_session(chrome, user_data_dir).await?;

    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to open page")?;
    page.goto(start_url)
        .await
        .context("failed to open the sign-in page")?;

    info!("waiting for the browser window to be closed");
    // The CDP handler stream ends when the browser process goes away;
    // awaiting it is the session-closed signal.
    let _ = handler.await;
    drop(browser);
    Ok(())
}
