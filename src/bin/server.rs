//! HTTP surface over the JSON project-file contract (spec §6): the excluded
//! GUI posts a project plus an analysis selection and gets back the solved
//! result, optionally reduced to a combination-set envelope.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    extract::Json,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use planar_fea::assembler::AnalysisKind;
use planar_fea::error::FEAError;
use planar_fea::io::project_file::{self, ProjectFile};
use planar_fea::loads::{self, LoadCase, LoadCombination};
use planar_fea::model::Model;
use planar_fea::post::{self, PostResult};
use planar_fea::solver::{self, CancellationToken, SolveOptions, SolverResult};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy", version: env!("CARGO_PKG_VERSION") })
}

/// What to solve for: one load case applied directly, one combination
/// applied by factored superposition, or an envelope across several
/// combinations (spec §4.F "Envelope").
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
enum Selection {
    LoadCase { load_case_id: u64 },
    Combination { combination_id: u64 },
    Envelope { combination_ids: Vec<u64> },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequest {
    project: ProjectFile,
    analysis_kind: AnalysisKind,
    selection: Selection,
    #[serde(default)]
    options: SolveOptions,
}

#[derive(Debug, Serialize)]
struct NodeDisplacement {
    node_id: u64,
    /// `(u, v, theta)` for frame/mixed, `(u, v)` for continuum, `(w, theta_x,
    /// theta_y)` for plate bending — see `analysis_kind` on the request.
    d0: f64,
    d1: f64,
    d2: f64,
}

#[derive(Debug, Serialize)]
struct NodeReaction {
    node_id: u64,
    r0: f64,
    r1: f64,
    r2: f64,
}

/// A solved result flattened into node-indexed displacement/reaction lists
/// plus whatever the post-processor derived, mirroring `ISolverResult`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolvedResultDto {
    displacements: Vec<NodeDisplacement>,
    reactions: Vec<NodeReaction>,
    beam_forces: BTreeMap<u64, BeamForcesDto>,
    continuum_stresses: BTreeMap<u64, post::ContinuumStress>,
    dkt_moments: BTreeMap<u64, post::DktMoments>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BeamForcesDto {
    max_n: f64,
    max_v: f64,
    max_m: f64,
    stations: Vec<StationDto>,
}

#[derive(Debug, Serialize)]
struct StationDto {
    x: f64,
    n: f64,
    v: f64,
    m: f64,
}

impl SolvedResultDto {
    fn from(kind: AnalysisKind, result: &SolverResult, post: &PostResult) -> Self {
        let dofs = kind.dofs_per_node();
        let mut displacements = Vec::new();
        let mut reactions = Vec::new();
        for node_id in result.dof_map.node_ids() {
            let base = result.dof_map.base(node_id).unwrap();
            let (d0, d1, d2) = match dofs {
                2 => (result.displacements[base], result.displacements[base + 1], 0.0),
                _ => (result.displacements[base], result.displacements[base + 1], result.displacements[base + 2]),
            };
            displacements.push(NodeDisplacement { node_id, d0, d1, d2 });

            let (r0, r1, r2) = match dofs {
                2 => (result.reactions[base], result.reactions[base + 1], 0.0),
                _ => (result.reactions[base], result.reactions[base + 1], result.reactions[base + 2]),
            };
            if r0 != 0.0 || r1 != 0.0 || r2 != 0.0 {
                reactions.push(NodeReaction { node_id, r0, r1, r2 });
            }
        }

        let beam_forces = post
            .beam_forces
            .iter()
            .map(|(&id, bf)| {
                let stations = bf.stations.iter().map(|s| StationDto { x: s.x, n: s.n, v: s.v, m: s.m }).collect();
                (id, BeamForcesDto { max_n: bf.max_n, max_v: bf.max_v, max_m: bf.max_m, stations })
            })
            .collect();

        Self {
            displacements,
            reactions,
            beam_forces,
            continuum_stresses: post.continuum_stresses.clone(),
            dkt_moments: post.dkt_moments.clone(),
            warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeDto {
    min_displacements: Vec<f64>,
    max_displacements: Vec<f64>,
    beams: BTreeMap<u64, post::BeamEnvelope>,
}

impl From<post::Envelope> for EnvelopeDto {
    fn from(env: post::Envelope) -> Self {
        Self {
            min_displacements: env.min_displacements.iter().copied().collect(),
            max_displacements: env.max_displacements.iter().copied().collect(),
            beams: env.beams.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<SolvedResultDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    envelope: Option<EnvelopeDto>,
}

fn solve_one(
    model: &Model,
    kind: AnalysisKind,
    options: &SolveOptions,
) -> Result<(SolverResult, PostResult), FEAError> {
    let result = solver::solve(model, kind, options, &CancellationToken::new())?;
    let post = post::process(model, kind, &result);
    Ok((result, post))
}

fn run_analysis(request: AnalysisRequest) -> Result<AnalysisResponse, FEAError> {
    let (base_model, cases, combinations) = project_file::from_project_file(&request.project)?;
    let kind = request.analysis_kind;

    match request.selection {
        Selection::LoadCase { load_case_id } => {
            let case: &LoadCase = cases.get(&load_case_id).ok_or(FEAError::LoadCaseNotFound(load_case_id))?;
            let mut model = base_model.clone();
            loads::apply_load_case_to_mesh(&mut model, case)?;
            let (result, post) = solve_one(&model, kind, &request.options)?;
            Ok(AnalysisResponse { result: Some(SolvedResultDto::from(kind, &result, &post)), envelope: None })
        }
        Selection::Combination { combination_id } => {
            let combo: &LoadCombination =
                combinations.iter().find(|c| c.id == combination_id).ok_or(FEAError::LoadCombinationNotFound(combination_id))?;
            let mut model = base_model.clone();
            loads::apply_combination_to_mesh(&mut model, combo, &cases)?;
            let (result, post) = solve_one(&model, kind, &request.options)?;
            Ok(AnalysisResponse { result: Some(SolvedResultDto::from(kind, &result, &post)), envelope: None })
        }
        Selection::Envelope { combination_ids } => {
            let mut results = Vec::new();
            let mut posts = Vec::new();
            for id in &combination_ids {
                let combo = combinations.iter().find(|c| c.id == *id).ok_or(FEAError::LoadCombinationNotFound(*id))?;
                let mut model = base_model.clone();
                loads::apply_combination_to_mesh(&mut model, combo, &cases)?;
                let (result, post) = solve_one(&model, kind, &request.options)?;
                results.push(result);
                posts.push(post);
            }
            let envelope = post::envelope(&results, &posts).map(EnvelopeDto::from);
            Ok(AnalysisResponse { result: None, envelope })
        }
    }
}

async fn analyze(Json(request): Json<AnalysisRequest>) -> impl IntoResponse {
    match run_analysis(request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            log::warn!("analysis request failed: {err}");
            (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new().route("/health", get(health)).route("/api/v1/analyze", post(analyze)).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8086));
    log::info!("planar-fea server listening on http://{addr}");
    log::info!("  health:   GET  /health");
    log::info!("  analysis: POST /api/v1/analyze");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
