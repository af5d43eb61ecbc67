use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use nact_web::cli::{init_tracing, FrontendArgs};
use nact_web::{transport, Calculation, Controller, FormSnapshot, SessionConfig, TransportEvent};

type SharedController = Arc<Mutex<Controller>>;

#[derive(Parser)]
#[command(name = "nact-web", version, about = "Serve the calculator page")]
struct Cli {
    #[command(flatten)]
    frontend: FrontendArgs,

    /// Address to serve on; overrides [server] bind
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Deserialize)]
struct FocusQuery {
    panel: String,
}

#[derive(Deserialize, Default)]
struct ResultsQuery {
    /// Number of blocks the page already shows.
    #[serde(default)]
    since: usize,
}

#[derive(Serialize, Debug)]
struct ResultsView {
    ready: bool,
    busy: bool,
    active: Calculation,
    count: usize,
    /// Blocks added after `since`, newest first.
    html: String,
}

#[derive(Serialize, Debug)]
struct ErrorView {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorView>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorView {
            error: error.to_string(),
        }),
    )
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Neutron activation and scattering calculator</title>
    <style>
      body { margin: 0 auto; max-width: 1100px; padding: 12px; font-family: "Segoe UI", sans-serif; color: #1d232a; }
      h1 { font-size: 20px; font-weight: 600; }
      form { display: flex; gap: 12px; flex-wrap: wrap; }
      fieldset { border: 1px solid #c5ccd4; border-radius: 8px; padding: 8px 12px; flex: 1; min-width: 320px; }
      fieldset:disabled { opacity: 0.6; }
      legend { font-size: 12px; text-transform: uppercase; letter-spacing: 0.1em; color: #59636e; }
      fieldset.active { border-color: #3c6a9e; }
      .row { display: flex; align-items: center; gap: 6px; margin-top: 6px; }
      .row label { font-size: 12px; color: #4a535c; min-width: 110px; }
      input[type="text"] { flex: 1; padding: 4px 6px; border: 1px solid #c5ccd4; border-radius: 6px; }
      button { background: #eef2f6; border: 1px solid #c5ccd4; border-radius: 6px; padding: 5px 10px; cursor: pointer; }
      button.primary { background: #1a2736; color: #fff; border-color: #3c6a9e; }
      #status { margin-top: 8px; font-size: 12px; color: #59636e; }
      #status.busy::after { content: " working..."; }
      table.tablesorter { border-collapse: collapse; margin-top: 6px; }
      table.tablesorter td, table.tablesorter th { padding: 2px 6px; }
      th.headerSortable { cursor: pointer; }
      th.sortUp::after { content: " \25B2"; }
      th.sortDown::after { content: " \25BC"; }
      tr.activity_unusual { background: #fff4d6; }
      .nocutoff { display: none; }
      body.show-all .cutoff { display: none; }
      body.show-all .nocutoff { display: block; }
      .disclaimer { font-size: 12px; font-style: italic; }
      pre.error { color: #a11; white-space: pre-wrap; }
      @media print { .no-print { display: none; } }
    </style>
  </head>
  <body>
    <h1>Neutron activation and scattering calculator</h1>
    <form id="calculator">
      <fieldset id="activation" data-panel="activation" disabled>
        <legend>Activation</legend>
        <div class="row"><label for="sample">Sample</label><input type="text" id="sample" name="sample" value="Co" /></div>
        <div class="row"><label for="mass">Mass (g)</label><input type="text" id="mass" name="mass" value="1" /></div>
        <div class="row"><label for="flux">Flux (n/cm&sup2;/s)</label><input type="text" id="flux" name="flux" value="1e8" /></div>
        <div class="row"><label for="Cd">Cd ratio</label><input type="text" id="Cd" name="Cd" value="0" /></div>
        <div class="row"><label for="fast">Thermal/fast ratio</label><input type="text" id="fast" name="fast" value="0" /></div>
        <div class="row"><label for="exposure">Exposure (hrs)</label><input type="text" id="exposure" name="exposure" value="1" /></div>
        <div class="row"><label for="time_off">Time off (hrs)</label><input type="text" id="time_off" name="time_off" value="720" /></div>
        <div class="row"><button type="submit" class="primary" value="activation">Calculate activation</button></div>
      </fieldset>
      <fieldset id="scattering" data-panel="scattering" disabled>
        <legend>Scattering</legend>
        <div class="row"><label for="density">Density (g/cm&sup3;)</label><input type="text" id="density" name="density" value="" /></div>
        <div class="row"><label for="thickness">Thickness (cm)</label><input type="text" id="thickness" name="thickness" value="1" /></div>
        <div class="row"><label for="wavelength">Neutron &lambda; (&Aring;)</label><input type="text" id="wavelength" name="wavelength" value="1.798" /></div>
        <div class="row"><label for="xray">X-ray source</label><input type="text" id="xray" name="xray" value="Cu Ka" /></div>
        <div class="row"><button type="submit" class="primary" value="scattering">Calculate scattering</button></div>
      </fieldset>
    </form>
    <div id="status" class="busy">Loading calculator</div>
    <div id="results"></div>
    <script>
      const form = document.getElementById("calculator");
      const status = document.getElementById("status");
      const results = document.getElementById("results");
      const panels = Array.from(form.querySelectorAll("fieldset"));
      let shown = 0;
      let polling = false;

      function show_cutoff(filtered) {
        document.body.classList.toggle("show-all", !filtered);
      }

      function sortKey(cell) {
        const key = cell.dataset.sort;
        if (key !== undefined && key !== "") return Number(key);
        return null;
      }

      function compareText(a, b) {
        const x = a.toLowerCase(), y = b.toLowerCase();
        if (x !== y) return x < y ? -1 : 1;
        return a < b ? -1 : a > b ? 1 : 0;
      }

      function compareCells(a, b, descending) {
        const x = sortKey(a), y = sortKey(b);
        if (x === null && y === null) {
          const cmp = compareText(a.textContent, b.textContent);
          return descending ? -cmp : cmp;
        }
        if (x === null) return 1;
        if (y === null) return -1;
        return descending ? y - x : x - y;
      }

      results.addEventListener("click", (event) => {
        const th = event.target.closest("th.headerSortable");
        if (!th) return;
        const table = th.closest("table");
        const column = Number(th.dataset.column);
        const descending = th.classList.contains("sortUp");
        table.querySelectorAll("th.headerSortable").forEach((h) => h.classList.remove("sortUp", "sortDown"));
        th.classList.add(descending ? "sortDown" : "sortUp");
        const body = table.tBodies[0];
        const rows = Array.from(body.rows);
        rows.sort((a, b) => compareCells(a.cells[column], b.cells[column], descending));
        rows.forEach((row) => body.appendChild(row));
      });

      function applyState(state) {
        panels.forEach((panel) => {
          panel.disabled = !state.ready;
          panel.classList.toggle("active", panel.dataset.panel === state.active);
        });
        status.textContent = state.ready ? "" : "Loading calculator";
        status.classList.toggle("busy", state.busy || !state.ready);
        if (state.html) {
          results.insertAdjacentHTML("afterbegin", state.html);
        }
        shown = state.count;
      }

      async function refresh() {
        const res = await fetch(`/results?since=${shown}`);
        const state = await res.json();
        applyState(state);
        return state;
      }

      async function poll() {
        if (polling) return;
        polling = true;
        try {
          let state = await refresh();
          while (state.busy || !state.ready) {
            await new Promise((resolve) => setTimeout(resolve, 500));
            state = await refresh();
          }
        } finally {
          polling = false;
        }
      }

      panels.forEach((panel) => {
        panel.addEventListener("focusin", () => {
          fetch(`/focus?panel=${panel.dataset.panel}`, { method: "POST" }).then(refresh);
        });
      });

      form.addEventListener("submit", async (event) => {
        event.preventDefault();
        const body = new URLSearchParams(new FormData(form));
        if (event.submitter && event.submitter.value) {
          body.set("action", event.submitter.value);
        }
        const res = await fetch("/submit", { method: "POST", body });
        if (!res.ok) {
          const err = await res.json();
          status.textContent = err.error;
        }
        poll();
      });

      form.addEventListener("keydown", (event) => {
        if (event.key === "Enter" && event.target.matches("input[type=text]")) {
          event.preventDefault();
          form.requestSubmit();
        }
      });

      poll();
    </script>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn focus(
    State(controller): State<SharedController>,
    Query(q): Query<FocusQuery>,
) -> Result<StatusCode, ApiError> {
    let panel = Calculation::parse(&q.panel).ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, format!("unknown panel {:?}", q.panel))
    })?;
    controller.lock().await.focus(panel);
    Ok(StatusCode::NO_CONTENT)
}

async fn submit(
    State(controller): State<SharedController>,
    Form(mut form): Form<FormSnapshot>,
) -> Result<StatusCode, ApiError> {
    let action = form.remove("action");
    let mut controller = controller.lock().await;
    let submitted = match action.as_deref() {
        None | Some("") => controller.enter(&form),
        Some(raw) => {
            let target = Calculation::parse(raw).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, format!("unknown action {raw:?}"))
            })?;
            controller.click(target, &form)
        }
    };
    submitted.map_err(|err| api_error(StatusCode::CONFLICT, err))?;
    Ok(StatusCode::ACCEPTED)
}

async fn results(
    State(controller): State<SharedController>,
    Query(q): Query<ResultsQuery>,
) -> Json<ResultsView> {
    let controller = controller.lock().await;
    let blocks: Vec<&str> = controller.results().collect();
    let fresh = blocks.len().saturating_sub(q.since);
    Json(ResultsView {
        ready: controller.is_ready(),
        busy: controller.is_busy(),
        active: controller.active(),
        count: blocks.len(),
        html: blocks[..fresh].concat(),
    })
}

async fn pump_events(mut events: mpsc::UnboundedReceiver<TransportEvent>, controller: SharedController) {
    while let Some(event) = events.recv().await {
        controller.lock().await.handle_event(event);
    }
    warn!("transport event stream closed");
}

fn router(controller: SharedController) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/focus", post(focus))
        .route("/submit", post(submit))
        .route("/results", get(results))
        .with_state(controller)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.frontend.load_config().context("loading configuration")?;
    let (session, warnings) = SessionConfig::from_launch(&config.session);
    for warning in &warnings {
        warn!(%warning, "launch parameter rejected");
    }

    let mut controller = Controller::new(session, &warnings, transport::from_config(&config.transport));
    let events = controller.start().await;
    let controller = Arc::new(Mutex::new(controller));
    tokio::spawn(pump_events(events, controller.clone()));

    let bind = cli.bind.unwrap_or(config.server.bind);
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Serving on http://{addr}");
    axum::serve(listener, router(controller)).await?;
    Ok(())
}
