use minijinja::{Environment, context};
use url::Url;

use crate::error::PreviewError;

use super::HttpRequest;

/// Render a built request as raw HTTP/1.1 text.
pub fn render_preview(request: &HttpRequest) -> Result<String, PreviewError> {
    let mut env = Environment::new();
    env.add_template(
        "http_request.j2",
        include_str!("../../templates/http_request.j2"),
    )?;
    let tmpl = env.get_template("http_request.j2")?;

    let (host, target) = match Url::parse(&request.url) {
        Ok(url) => {
            let host = url.host_str().map(|host| match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            });
            let mut target = url.path().to_string();
            if let Some(query) = url.query() {
                target.push('?');
                target.push_str(query);
            }
            (host, target)
        }
        Err(_) => (None, request.url.clone()),
    };

    let rendered = tmpl.render(context! {
        method => request.method.to_string(),
        target => target,
        host => host,
        headers => &request.headers,
        body => &request.body,
    })?;
    Ok(rendered)
}
