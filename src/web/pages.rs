//! Embedded HTML/CSS/JS for the login and dashboard pages.
//!
//! Both pages are compiled into the binary as string constants. No external
//! assets, no build tools, no CDN dependencies. Charts are drawn as inline
//! SVG from the view models served by `/api/dashboard`.

/// Placeholder in [`LOGIN_HTML`] replaced by the alert script.
const ALERT_SLOT: &str = "<!--ALERT-->";

/// Render the login page, optionally raising a blocking alert.
pub fn login_page(alert: Option<&str>) -> String {
    let script = match alert {
        // serde_json produces a valid JS string literal; `</` is escaped so
        // the message cannot close the script element.
        Some(message) => format!(
            "<script>alert({});</script>",
            serde_json::to_string(message)
                .unwrap_or_else(|_| "\"Invalid credentials\"".to_string())
                .replace("</", "<\\/")
        ),
        None => String::new(),
    };
    LOGIN_HTML.replace(ALERT_SLOT, &script)
}

/// The login page. Contains [`ALERT_SLOT`].
const LOGIN_HTML: &str = concat!(
    r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sign in · timelens</title>
<style>"##,
    r##"
:root { --bg: #0d1117; --surface: #161b22; --border: #30363d; --text: #e6edf3; --text-muted: #8b949e; --accent: #58a6ff; --green: #3fb950; }
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; font-size: 14px; }
.login { max-width: 380px; margin: 80px auto; background: var(--surface); border: 1px solid var(--border); border-radius: 8px; padding: 32px; }
.login h1 { font-size: 22px; font-weight: 600; text-align: center; margin-bottom: 20px; }
.login label { display: block; color: var(--text-muted); font-size: 12px; margin: 12px 0 4px; }
.login input { width: 100%; padding: 10px 12px; background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; font: inherit; }
.login button { width: 100%; margin-top: 24px; padding: 10px; background: var(--accent); color: #fff; border: none; border-radius: 6px; font: inherit; font-weight: 600; cursor: pointer; }
.hint { margin-top: 20px; padding: 12px; border: 1px solid var(--green); border-radius: 6px; color: var(--green); font-size: 12px; }
"##,
    r##"</style>
</head>
<body>
<form class="login" method="post" action="/login">
  <h1>Sign in</h1>
  <label for="email">Email Address</label>
  <input id="email" name="email" type="email" required autofocus>
  <label for="password">Password</label>
  <input id="password" name="password" type="password" required>
  <button type="submit">Sign In</button>
  <div class="hint">Demo gate only. Accounts are listed under <code>[auth]</code> in the config file.</div>
</form>
<!--ALERT-->
</body>
</html>
"##
);

/// The dashboard single-page app.
pub const DASHBOARD_HTML: &str = concat!(
    r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>timelens Dashboard</title>
<style>"##,
    r##"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --radius: 8px;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; font-size: 14px; line-height: 1.5; }
.app { padding: 2rem; display: flex; flex-direction: column; gap: 2rem; }
.topbar { display: flex; justify-content: space-between; align-items: center; }
.topbar h1 { font-size: 22px; font-weight: 600; }
.controls { display: flex; flex-wrap: wrap; align-items: center; gap: 1rem; }
.controls label { display: flex; flex-direction: column; font-size: 12px; color: var(--text-muted); gap: 4px; }
button, select, input { font: inherit; color: var(--text); background: var(--bg); border: 1px solid var(--border); border-radius: 6px; padding: 8px 12px; }
button { cursor: pointer; }
button.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
button:hover { border-color: var(--accent); }
.charts { display: flex; flex-wrap: wrap; gap: 2rem; align-items: flex-start; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 20px; width: 48%; min-width: 320px; flex: 1; }
.card h2 { font-size: 15px; font-weight: 600; margin-bottom: 12px; text-align: center; }
.empty { color: var(--text-muted); text-align: center; padding: 40px 0; }
svg text { fill: var(--text-muted); font-size: 11px; }
svg .bar { fill: rgba(75, 192, 192, 0.6); stroke: rgba(75, 192, 192, 1); stroke-width: 1; cursor: pointer; }
svg .bar:hover, svg .bar.selected { fill: rgba(75, 192, 192, 1); }
svg .line { fill: none; stroke: var(--accent); stroke-width: 2; }
svg .marker { fill: var(--accent); }
svg .axis { stroke: var(--border); }
.toast { position: fixed; bottom: 24px; right: 24px; padding: 10px 16px; background: var(--surface); border: 1px solid var(--accent); border-radius: 6px; opacity: 0; transition: opacity 0.2s; }
.toast.show { opacity: 1; }
"##,
    r##"</style>
</head>
<body>
<div class="app">
  <div class="topbar">
    <h1>Time Spent Analytics</h1>
    <form method="post" action="/logout"><button type="submit">Logout</button></form>
  </div>

  <div class="controls">
    <label>Start Date <input id="startDate" type="date"></label>
    <label>End Date <input id="endDate" type="date"></label>
    <label>Age
      <select id="age">
        <option value="15-25">15-25</option>
        <option value="&gt;25">&gt;25</option>
      </select>
    </label>
    <label>Gender
      <select id="gender">
        <option value="Male">Male</option>
        <option value="Female">Female</option>
      </select>
    </label>
    <button id="apply">Apply Filters</button>
    <button id="share" class="primary">Copy Share URL</button>
  </div>

  <div class="charts">
    <div class="card"><h2 id="barTitle">Total Time Spent</h2><div id="bars"></div></div>
    <div class="card"><h2 id="lineTitle">Total Time Spent Per Day</h2><div id="line"></div></div>
  </div>
</div>
<div id="toast" class="toast"></div>

<script>
const SVG = 'http://www.w3.org/2000/svg';

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {}, credentials: 'same-origin' };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  if (res.status === 401) { window.location.href = '/login'; return null; }
  if (res.status === 409) { window.location.reload(); return null; }
  const data = await res.json();
  if (!res.ok) { toast(data.error || 'request failed'); return null; }
  return data;
}

function toast(msg) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show';
  setTimeout(() => el.className = 'toast', 2500);
}

// DD-MM-YYYY <-> YYYY-MM-DD (date inputs)
function toInput(d) { const [dd, mm, yyyy] = d.split('-'); return `${yyyy}-${mm}-${dd}`; }
function fromInput(v) { const [yyyy, mm, dd] = v.split('-'); return `${dd}-${mm}-${yyyy}`; }

function el(name, attrs, text) {
  const node = document.createElementNS(SVG, name);
  for (const [k, v] of Object.entries(attrs || {})) node.setAttribute(k, v);
  if (text !== undefined) node.textContent = text;
  return node;
}

function ensureOption(select, value) {
  if (![...select.options].some(o => o.value === value)) {
    const opt = document.createElement('option');
    opt.value = value;
    opt.textContent = value;
    select.appendChild(opt);
  }
  select.value = value;
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------
function render(view) {
  if (!view) return;
  const f = view.filters;
  document.getElementById('startDate').value = toInput(f.startDate);
  document.getElementById('endDate').value = toInput(f.endDate);
  ensureOption(document.getElementById('age'), f.age);
  ensureOption(document.getElementById('gender'), f.gender);
  renderBars(view.barChart, view.selectedFeature);
  renderLine(view.lineChart, view.selectedFeature);
}

function renderBars(chart, selected) {
  const host = document.getElementById('bars');
  host.innerHTML = '';
  document.getElementById('barTitle').textContent = chart.dataset.label;
  if (chart.segments.length === 0) {
    host.innerHTML = '<div class="empty">No data for this selection</div>';
    return;
  }

  const rowH = 28, labelW = 120, width = 520;
  const height = chart.segments.length * rowH + 20;
  const max = Math.max(...chart.segments.map(s => s.value), 1);
  const svg = el('svg', { viewBox: `0 0 ${width} ${height}`, width: '100%' });

  chart.segments.forEach((seg, i) => {
    const y = i * rowH + 10;
    const w = (seg.value / max) * (width - labelW - 60);
    svg.appendChild(el('text', { x: labelW - 8, y: y + rowH / 2, 'text-anchor': 'end', 'dominant-baseline': 'middle' }, seg.feature));
    const bar = el('rect', { x: labelW, y: y + 4, width: Math.max(w, 1), height: rowH - 8, class: 'bar' + (seg.feature === selected ? ' selected' : '') });
    bar.dataset.feature = seg.feature;
    bar.addEventListener('click', () => selectBar(seg.feature));
    svg.appendChild(bar);
    svg.appendChild(el('text', { x: labelW + Math.max(w, 1) + 6, y: y + rowH / 2, 'dominant-baseline': 'middle' }, seg.value.toLocaleString()));
  });
  host.appendChild(svg);
}

function renderLine(chart, selected) {
  const host = document.getElementById('line');
  host.innerHTML = '';
  document.getElementById('lineTitle').textContent = selected ? `${chart.title} · ${selected}` : chart.title;
  const data = chart.series[0] ? chart.series[0].data : [];
  if (data.length === 0) {
    host.innerHTML = '<div class="empty">Click a bar to see its daily trend</div>';
    return;
  }

  const width = 520, height = 300, pad = 40;
  const max = Math.max(...data, 1);
  const step = data.length > 1 ? (width - 2 * pad) / (data.length - 1) : 0;
  const x = i => pad + i * step;
  const y = v => height - pad - (v / max) * (height - 2 * pad);
  const svg = el('svg', { viewBox: `0 0 ${width} ${height}`, width: '100%' });

  svg.appendChild(el('line', { x1: pad, y1: height - pad, x2: width - pad, y2: height - pad, class: 'axis' }));
  svg.appendChild(el('line', { x1: pad, y1: pad, x2: pad, y2: height - pad, class: 'axis' }));
  svg.appendChild(el('text', { x: pad - 6, y: pad, 'text-anchor': 'end' }, max.toLocaleString()));
  svg.appendChild(el('polyline', { points: data.map((v, i) => `${x(i)},${y(v)}`).join(' '), class: 'line' }));

  data.forEach((v, i) => {
    const dot = el('circle', { cx: x(i), cy: y(v), r: 4, class: 'marker' });
    dot.appendChild(el('title', {}, `${chart.categories[i]}: ${v}`));
    svg.appendChild(dot);
    svg.appendChild(el('text', { x: x(i), y: height - pad + 16, 'text-anchor': 'middle' }, chart.categories[i].slice(5)));
  });
  host.appendChild(svg);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------
async function editFilter(field, value) {
  render(await api('PUT', '/api/dashboard/filters', { field, value }));
}

async function selectBar(feature) {
  render(await api('POST', '/api/dashboard/select', { feature }));
}

document.getElementById('startDate').addEventListener('change', e => e.target.value && editFilter('startDate', fromInput(e.target.value)));
document.getElementById('endDate').addEventListener('change', e => e.target.value && editFilter('endDate', fromInput(e.target.value)));
document.getElementById('age').addEventListener('change', e => editFilter('age', e.target.value));
document.getElementById('gender').addEventListener('change', e => editFilter('gender', e.target.value));

document.getElementById('apply').addEventListener('click', async () => {
  render(await api('POST', '/api/dashboard/apply'));
});

document.getElementById('share').addEventListener('click', async () => {
  const data = await api('GET', '/api/dashboard/share');
  if (!data) return;
  try {
    await navigator.clipboard.writeText(data.url);
    toast('Share URL copied');
  } catch (_) {
    window.prompt('Copy this URL', data.url);
  }
});

api('GET', '/api/dashboard').then(render);
</script>
</body>
</html>
"##
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
