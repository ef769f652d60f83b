//! The viewer page at `/`.
//!
//! A single HTML page holding both the login screen and the log viewer.
//! The normalized view table is embedded as JSON so the page needs no
//! extra round-trip to build its dropdown, and every response carries a
//! fresh CSP nonce for the one inline script. No CDN assets — the page
//! is self-contained.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_SECURITY_POLICY;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;

use vipervault_core::session::new_token;

use crate::state::AppState;

/// Build the UI router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(viewer_page))
}

/// One dropdown entry as the page's script sees it.
#[derive(Serialize)]
struct ViewEntry<'a> {
    name: &'a str,
    cmd: &'a str,
    refresh: u64,
    safe_output: bool,
    bottom: bool,
}

async fn viewer_page(State(state): State<Arc<AppState>>) -> Response {
    let nonce = new_token();

    let entries: Vec<ViewEntry<'_>> = state
        .config
        .views()
        .iter()
        .map(|(name, view)| ViewEntry {
            name,
            cmd: &view.cmd,
            refresh: view.refresh,
            safe_output: view.safe_output,
            bottom: view.bottom,
        })
        .collect();

    // `<` must not appear inside the inline script, or a crafted command
    // string could close the tag.
    let views_json = serde_json::to_string(&entries)
        .unwrap_or_else(|_| "[]".to_owned())
        .replace('<', "\\u003c");

    let mut html = String::with_capacity(32_768);
    html.push_str(PAGE_HEAD);
    let body = PAGE_BODY
        .replace("{{VIEWS_JSON}}", &views_json)
        .replace("{{NONCE}}", &nonce);
    html.push_str(&body);

    let csp = format!(
        "default-src 'self'; script-src 'nonce-{nonce}'; style-src 'unsafe-inline'"
    );

    ([(CONTENT_SECURITY_POLICY, csp)], Html(html)).into_response()
}

/// Document head and styles for the viewer page.
const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>ViperVault</title>
<style>
:root{--bg:#ffffff;--text:#000000;--log-bg:#f8f8f8;--log-border:#ccc;--muted:#555;--accent:#0066cc;--input-bg:#fff}
body.dark{--bg:#0d1117;--text:#c9d1d9;--log-bg:#161b22;--log-border:#30363d;--muted:#8b949e;--accent:#58a6ff;--input-bg:#21262d}
html,body{height:100%;margin:0;padding:0;overflow:hidden}
body{font-family:monospace;background:var(--bg);color:var(--text);transition:background .3s,color .3s}
#login-screen{display:none;align-items:center;justify-content:center;height:100vh;flex-direction:column;gap:20px}
#login-screen h1{color:var(--accent);margin:0}
#login-form{display:flex;flex-direction:column;gap:12px;min-width:300px}
#login-form input{padding:10px;font-family:monospace;font-size:1em;background:var(--input-bg);color:var(--text);border:1px solid var(--log-border);border-radius:6px}
#login-form button{padding:10px;font-family:monospace;font-size:1em;background:var(--accent);color:#fff;border:none;border-radius:6px;cursor:pointer}
#login-error{color:#d73a49;display:none;text-align:center}
#content{display:none;flex-direction:column;height:100vh;padding:20px;box-sizing:border-box}
#controls{margin-bottom:12px;display:flex;flex-wrap:wrap;gap:12px;align-items:center}
select,#log-search{padding:8px 12px;font-family:monospace;background:var(--input-bg);color:var(--text);border:1px solid var(--log-border);border-radius:6px}
select{min-width:240px}
#search-container{position:relative;flex-grow:1;display:flex;align-items:center;min-width:180px}
#log-search{width:100%;padding-right:32px}
#clear-search{position:absolute;right:10px;cursor:pointer;font-weight:bold;color:var(--muted);display:none;user-select:none}
#log-output{flex-grow:1;white-space:pre-wrap;background:var(--log-bg);border:1px solid var(--log-border);padding:12px;overflow-y:auto;border-radius:6px;margin-bottom:12px}
#status-bar{display:flex;align-items:center;gap:12px;font-size:.9em;color:var(--muted)}
#pause-btn{padding:4px 12px;cursor:pointer;border:1px solid var(--log-border);border-radius:4px;font-family:monospace;font-weight:bold;color:#fff}
.btn-running{background:#d73a49}
.btn-paused{background:#28a745}
#top-controls{display:flex;gap:8px;justify-content:flex-end;margin-bottom:8px}
#theme-toggle,#logout-btn,#info-btn{padding:8px 12px;background:var(--log-bg);border:1px solid var(--log-border);color:var(--text);cursor:pointer;border-radius:4px}
h1{color:var(--accent);margin:0 0 8px 0}
#info-modal{display:none;position:fixed;z-index:1000;left:0;top:0;width:100%;height:100%;background:rgba(0,0,0,.5);align-items:center;justify-content:center}
#info-modal-content{background:var(--bg);color:var(--text);border:1px solid var(--log-border);border-radius:8px;padding:24px;min-width:320px;max-width:640px}
#info-modal-content h2{color:var(--accent);margin:0 0 12px 0}
#info-modal-content dt{color:var(--muted);margin-top:8px}
#info-modal-content dd{margin:2px 0 0 0;word-break:break-all}
#info-close{margin-top:16px;padding:8px 12px;background:var(--log-bg);border:1px solid var(--log-border);color:var(--text);cursor:pointer;border-radius:4px}
</style></head>
"##;

/// Page body and the inline viewer script.
const PAGE_BODY: &str = r##"<body>
<div id="login-screen">
  <h1>ViperVault</h1>
  <form id="login-form">
    <input type="password" id="password" placeholder="Password" autocomplete="current-password" autofocus/>
    <button type="submit">Unlock</button>
    <div id="login-error">Incorrect password.</div>
  </form>
</div>
<div id="content">
  <div id="top-controls">
    <button id="info-btn" title="View details">&#8505;</button>
    <button id="theme-toggle" title="Toggle theme">&#127769;</button>
    <button id="logout-btn" title="Log out">Logout</button>
  </div>
  <h1>ViperVault</h1>
  <div id="controls">
    <select id="log-selector"><option value="">-- select a view --</option></select>
    <div id="search-container">
      <input type="text" id="log-search" placeholder="Filter (substring or regex, / to focus)"/>
      <span id="clear-search" title="Clear filter">&#215;</span>
    </div>
    <button id="pause-btn" class="btn-running">Pause</button>
  </div>
  <div id="log-output"></div>
  <div id="status-bar"><span id="countdown"></span></div>
</div>
<div id="info-modal">
  <div id="info-modal-content">
    <h2 id="info-view-name"></h2>
    <dl>
      <dt>Command</dt><dd id="info-cmd"></dd>
      <dt>Refresh</dt><dd id="info-refresh"></dd>
      <dt>HTML-escaped output</dt><dd id="info-safe"></dd>
      <dt>Scroll to bottom</dt><dd id="info-bottom"></dd>
    </dl>
    <button id="info-close">Close</button>
  </div>
</div>
<script nonce="{{NONCE}}">
const VIEWS = {{VIEWS_JSON}};
const STORAGE_KEY = 'vipervault-last-view';

const loginScreen = document.getElementById('login-screen');
const loginForm = document.getElementById('login-form');
const loginError = document.getElementById('login-error');
const passwordInput = document.getElementById('password');
const content = document.getElementById('content');
const selector = document.getElementById('log-selector');
const output = document.getElementById('log-output');
const search = document.getElementById('log-search');
const clearSearch = document.getElementById('clear-search');
const pauseBtn = document.getElementById('pause-btn');
const countdownEl = document.getElementById('countdown');
const infoModal = document.getElementById('info-modal');

let currentView = null;
let refreshTimer = null;
let countdownTimer = null;
let secondsLeft = 0;
let paused = false;
let lastBody = '';

for (const v of VIEWS) {
  const opt = document.createElement('option');
  opt.value = v.name;
  opt.textContent = v.name;
  selector.appendChild(opt);
}

function viewByName(name) {
  return VIEWS.find(v => v.name === name) || null;
}

function showLogin() {
  content.style.display = 'none';
  loginScreen.style.display = 'flex';
  stopTimers();
  currentView = null;
  passwordInput.focus();
}

function showContent() {
  loginScreen.style.display = 'none';
  content.style.display = 'flex';
  loginError.style.display = 'none';
  passwordInput.value = '';
  const saved = localStorage.getItem(STORAGE_KEY);
  if (saved && viewByName(saved)) {
    selector.value = saved;
    selectView(saved);
  } else if (VIEWS.length > 0) {
    selector.value = VIEWS[0].name;
    selectView(VIEWS[0].name);
  }
}

function stopTimers() {
  clearTimeout(refreshTimer);
  clearInterval(countdownTimer);
  countdownEl.textContent = '';
}

function render() {
  clearSearch.style.display = search.value ? 'block' : 'none';
  const q = search.value;
  if (!q) { output.innerHTML = lastBody; return; }
  let test;
  try { const re = new RegExp(q, 'i'); test = line => re.test(line); }
  catch (_) { const lq = q.toLowerCase(); test = line => line.toLowerCase().includes(lq); }
  output.innerHTML = lastBody.split('\n').filter(test).join('\n');
}

async function loadView(name) {
  const view = viewByName(name);
  if (!view) return;
  try {
    const resp = await fetch('/api/log?view=' + encodeURIComponent(name));
    if (resp.status === 401) { showLogin(); return; }
    lastBody = await resp.text();
    render();
    if (view.bottom) output.scrollTop = output.scrollHeight;
    scheduleRefresh(view);
  } catch (_) {
    clearTimeout(refreshTimer);
    clearInterval(countdownTimer);
    countdownEl.textContent = 'Error fetching logs, retrying in 5s...';
    refreshTimer = setTimeout(() => loadView(name), 5000);
  }
}

function scheduleRefresh(view) {
  stopTimers();
  if (view.refresh <= 0) {
    pauseBtn.style.display = 'none';
    countdownEl.textContent = 'Auto-refresh disabled';
    return;
  }
  pauseBtn.style.display = '';
  if (paused) { countdownEl.textContent = 'paused'; return; }
  secondsLeft = view.refresh;
  countdownEl.textContent = 'refresh in ' + secondsLeft + 's';
  countdownTimer = setInterval(() => {
    secondsLeft -= 1;
    countdownEl.textContent = 'refresh in ' + Math.max(secondsLeft, 0) + 's';
  }, 1000);
  refreshTimer = setTimeout(() => loadView(view.name), view.refresh * 1000);
}

function selectView(name) {
  currentView = name;
  localStorage.setItem(STORAGE_KEY, name);
  loadView(name);
}

selector.addEventListener('change', () => {
  if (selector.value) selectView(selector.value);
});

search.addEventListener('input', render);

clearSearch.addEventListener('click', () => {
  search.value = '';
  render();
  search.focus();
});

function showInfoModal() {
  const view = currentView && viewByName(currentView);
  if (!view) return;
  document.getElementById('info-view-name').textContent = view.name;
  document.getElementById('info-cmd').textContent = view.cmd;
  document.getElementById('info-refresh').textContent =
    view.refresh > 0 ? 'every ' + view.refresh + 's' : 'disabled';
  document.getElementById('info-safe').textContent = view.safe_output ? 'yes' : 'no';
  document.getElementById('info-bottom').textContent = view.bottom ? 'yes' : 'no';
  infoModal.style.display = 'flex';
}

document.getElementById('info-btn').addEventListener('click', showInfoModal);
document.getElementById('info-close').addEventListener('click', () => {
  infoModal.style.display = 'none';
});
infoModal.addEventListener('click', (e) => {
  if (e.target === infoModal) infoModal.style.display = 'none';
});

document.addEventListener('keydown', (e) => {
  if (content.style.display !== 'flex') return;
  if (e.key === 'Escape') {
    if (infoModal.style.display === 'flex') { infoModal.style.display = 'none'; return; }
    if (search.value || document.activeElement === search) {
      search.value = '';
      render();
      search.blur();
    }
    return;
  }
  if (e.key === '/' && document.activeElement !== search) {
    e.preventDefault();
    search.focus();
  }
});

pauseBtn.addEventListener('click', () => {
  paused = !paused;
  pauseBtn.textContent = paused ? 'Resume' : 'Pause';
  pauseBtn.className = paused ? 'btn-paused' : 'btn-running';
  if (currentView) {
    const view = viewByName(currentView);
    if (paused) { stopTimers(); countdownEl.textContent = 'paused'; }
    else scheduleRefresh(view);
  }
});

loginForm.addEventListener('submit', async (e) => {
  e.preventDefault();
  try {
    const resp = await fetch('/api/login', {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify({password: passwordInput.value})
    });
    const data = await resp.json();
    if (data.success) { showContent(); }
    else {
      loginError.style.display = 'block';
      passwordInput.value = '';
      passwordInput.focus();
    }
  } catch (_) {
    loginError.textContent = 'Login error. Please try again.';
    loginError.style.display = 'block';
  }
});

document.getElementById('logout-btn').addEventListener('click', async () => {
  await fetch('/api/logout', {method: 'POST'});
  showLogin();
});

function setTheme(t) {
  document.body.classList.toggle('dark', t === 'dark');
  document.getElementById('theme-toggle').innerHTML = t === 'dark' ? '&#9728;&#65039;' : '&#127769;';
  localStorage.setItem('theme', t);
}

document.getElementById('theme-toggle').addEventListener('click', () => {
  setTheme(document.body.classList.contains('dark') ? 'light' : 'dark');
});

(function init() {
  const savedTheme = localStorage.getItem('theme');
  if (savedTheme) setTheme(savedTheme);
  else if (window.matchMedia && window.matchMedia('(prefers-color-scheme: dark)').matches) setTheme('dark');
  else setTheme('light');

  fetch('/api/session')
    .then(r => r.json())
    .then(data => { if (data.authenticated) showContent(); else showLogin(); })
    .catch(() => showLogin());
})();
</script>
</body></html>
"##;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "password": "pw",
        "log_views": {
            "syslog": "tail -n 50 </var/log/syslog",
            "apple": "uptime"
        }
    }"#;

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn page_embeds_views_and_nonce() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let resp = viewer_page(State(state)).await;
        let csp = resp
            .headers()
            .get(CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let nonce = csp
            .split("'nonce-")
            .nth(1)
            .unwrap()
            .split('\'')
            .next()
            .unwrap()
            .to_owned();

        let html = body_text(resp).await;
        assert!(html.contains(&format!("<script nonce=\"{nonce}\">")));
        assert!(html.contains("\"name\":\"apple\""));
        assert!(html.contains("\"name\":\"syslog\""));
        // No leftover placeholders.
        assert!(!html.contains("{{VIEWS_JSON}}"));
        assert!(!html.contains("{{NONCE}}"));
    }

    #[tokio::test]
    async fn command_strings_cannot_close_the_script_tag() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let html = body_text(viewer_page(State(state)).await).await;
        // The `<` in the syslog command must be unicode-escaped.
        assert!(html.contains("\\u003c/var/log/syslog"));
    }

    #[tokio::test]
    async fn zero_refresh_view_disables_auto_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let config = r#"{"password": "pw", "log_views": {"once": {"cmd": "uptime", "refresh": 0}}}"#;
        let state = AppState::for_tests(dir.path(), config).await;

        let html = body_text(viewer_page(State(state)).await).await;
        // A refresh of 0 must stop the timer chain instead of looping.
        assert!(html.contains("if (view.refresh <= 0)"));
        assert!(html.contains("Auto-refresh disabled"));
        assert!(html.contains("\"refresh\":0"));
    }

    #[tokio::test]
    async fn fetch_failure_retries_instead_of_dying() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let html = body_text(viewer_page(State(state)).await).await;
        assert!(html.contains("Error fetching logs, retrying in 5s..."));
        assert!(html.contains("setTimeout(() => loadView(name), 5000)"));
    }

    #[tokio::test]
    async fn page_carries_info_modal_and_search_shortcuts() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let html = body_text(viewer_page(State(state)).await).await;
        assert!(html.contains("id=\"info-modal\""));
        assert!(html.contains("id=\"info-cmd\""));
        assert!(html.contains("id=\"clear-search\""));
        assert!(html.contains("e.key === '/'"));
        assert!(html.contains("e.key === 'Escape'"));
    }

    #[tokio::test]
    async fn nonce_is_fresh_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let a = viewer_page(State(Arc::clone(&state))).await;
        let b = viewer_page(State(state)).await;
        assert_ne!(
            a.headers().get(CONTENT_SECURITY_POLICY).unwrap(),
            b.headers().get(CONTENT_SECURITY_POLICY).unwrap()
        );
    }
}
