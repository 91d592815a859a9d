use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::DownloadError;

pub const LOGIN_URL: &str = "https://my.libsyn.com/auth/login";

static LOGIN_FORM_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"form[name="login_form"]"#).unwrap());
static INPUT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("input[name]").unwrap());

/// Sign in to my.libsyn.com. Session cookies land in the client's cookie
/// store and are sent with later downloads.
pub async fn login(
    client: &reqwest::Client,
    username: &str,
    password: &str,
) -> Result<(), DownloadError> {
    let response = client.get(LOGIN_URL).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Login(format!(
            "login page returned {}",
            response.status()
        )));
    }
    let page_url = response.url().clone();
    let html = response.text().await?;

    let (action, fields) = login_form(&html, &page_url, username, password)?;

    let response = client.post(action).form(&fields).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Login(format!(
            "logging in returned {}",
            response.status()
        )));
    }
    tracing::info!("Logged into my.libsyn.com");
    Ok(())
}

/// Action URL and field values of the login form, credentials filled in.
fn login_form(
    html: &str,
    page_url: &Url,
    username: &str,
    password: &str,
) -> Result<(Url, Vec<(String, String)>), DownloadError> {
    let document = Html::parse_document(html);
    let form = document
        .select(&LOGIN_FORM_SEL)
        .next()
        .ok_or_else(|| DownloadError::Login("login_form is missing".to_string()))?;

    let action = form
        .value()
        .attr("action")
        .map(|a| page_url.join(a))
        .unwrap_or_else(|| Ok(page_url.clone()))
        .map_err(|e| DownloadError::Login(format!("bad form action: {}", e)))?;

    let mut fields: Vec<(String, String)> = form
        .select(&INPUT_SEL)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            if name == "email" || name == "password" {
                return None;
            }
            Some((
                name.to_string(),
                input.value().attr("value").unwrap_or("").to_string(),
            ))
        })
        .collect();
    fields.push(("email".to_string(), username.to_string()));
    fields.push(("password".to_string(), password.to_string()));

    Ok((action, fields))
}

/// Stream `url` into `save_to`. A partial file is removed on failure.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    save_to: &Path,
) -> Result<u64, DownloadError> {
    match try_download(client, url, save_to).await {
        Ok(size) => Ok(size),
        Err(e) => {
            let _ = tokio::fs::remove_file(save_to).await;
            Err(e)
        }
    }
}

async fn try_download(
    client: &reqwest::Client,
    url: &str,
    save_to: &Path,
) -> Result<u64, DownloadError> {
    tracing::debug!("Downloading {} to {:?}", url, save_to);

    let mut response = client
        .get(url)
        .timeout(Duration::from_secs(600))
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(DownloadError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(save_to).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_login_form_and_keeps_hidden_fields() {
        let html = r#"<html><body>
<form name="search"><input name="q" value="x"></form>
<form name="login_form" action="/auth/login/submit" method="post">
  <input type="hidden" name="csrf" value="token123">
  <input type="text" name="email" value="">
  <input type="password" name="password">
  <input type="submit" value="Log in">
</form></body></html>"#;
        let page = Url::parse(LOGIN_URL).unwrap();

        let (action, fields) = login_form(html, &page, "me@example.com", "hunter2").unwrap();

        assert_eq!(action.as_str(), "https://my.libsyn.com/auth/login/submit");
        assert_eq!(
            fields,
            vec![
                ("csrf".to_string(), "token123".to_string()),
                ("email".to_string(), "me@example.com".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ]
        );
    }

    #[test]
    fn missing_login_form_is_an_error() {
        let page = Url::parse(LOGIN_URL).unwrap();
        let err = login_form("<html></html>", &page, "a", "b").unwrap_err();
        assert!(matches!(err, DownloadError::Login(_)));
    }

    #[test]
    fn form_without_action_posts_back_to_page() {
        let page = Url::parse(LOGIN_URL).unwrap();
        let (action, _) =
            login_form(r#"<form name="login_form"></form>"#, &page, "a", "b").unwrap();
        assert_eq!(action, page);
    }
}
