//! Single-threaded request executor.
//!
//! A [`Worker`] runs one request to completion and always answers an
//! accepted request, recovering from bad input locally: unusable bounds are
//! skipped, a camera that cannot project yields empty results, and a
//! malformed mesh yields an empty mesh. Only messages that cannot be decoded
//! at all go unanswered.

use std::time::Instant;

use orrery_cull::{Frustum, cull_batch};
use orrery_lod::{LodSelector, compute_errors, select_lods};
use orrery_math::Viewport;
use orrery_simplify::{SimplifiedMesh, simplify};

use crate::protocol::{ComputeErrors, FrustumCull, Request, Response, SelectLods, SimplifyGeometry};

/// Counters kept by one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests executed (including ones answered with an empty result).
    pub handled: u64,
    /// Encoded messages dropped without a response.
    pub rejected: u64,
}

/// Executes requests against its own copy of the LOD configuration.
#[derive(Debug, Clone)]
pub struct Worker {
    id: usize,
    selector: LodSelector,
    stats: WorkerStats,
}

impl Worker {
    pub fn new(id: usize, selector: LodSelector) -> Self {
        Self {
            id,
            selector,
            stats: WorkerStats::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Run `request` to completion.
    pub fn handle(&mut self, request: Request) -> Response {
        let kind = request.kind();
        let start = Instant::now();

        let response = match request {
            Request::SelectLods(payload) => self.select_lods(payload),
            Request::SimplifyGeometry(payload) => self.simplify(payload),
            Request::FrustumCull(payload) => self.frustum_cull(payload),
            Request::ComputeErrors(payload) => self.compute_errors(payload),
        };

        self.stats.handled += 1;
        tracing::debug!(
            worker = self.id,
            %kind,
            elapsed_us = start.elapsed().as_micros() as u64,
            "task complete"
        );
        response
    }

    /// Decode and run a JSON request. Returns `None` for messages that are
    /// not JSON, carry an unknown `"type"`, or whose payload does not parse.
    pub fn handle_encoded(&mut self, text: &str) -> Option<Response> {
        match Request::decode(text) {
            Ok(request) => Some(self.handle(request)),
            Err(err) => {
                self.stats.rejected += 1;
                tracing::warn!(worker = self.id, error = %err, "dropping request");
                None
            }
        }
    }

    fn select_lods(&self, payload: SelectLods) -> Response {
        let viewport = Viewport {
            width: payload.viewport_width,
            height: payload.viewport_height,
        };
        let results = match select_lods(
            &self.selector,
            &payload.clusters,
            &payload.camera,
            viewport,
            payload.error_threshold,
        ) {
            Ok(results) => {
                let skipped = payload.clusters.len() - results.len();
                if skipped > 0 {
                    tracing::debug!(worker = self.id, skipped, "clusters with unusable bounds");
                }
                results
            }
            Err(err) => {
                tracing::warn!(worker = self.id, error = %err, "LOD selection skipped");
                Vec::new()
            }
        };
        Response::LodSelectionComplete { results }
    }

    fn compute_errors(&self, payload: ComputeErrors) -> Response {
        let errors = compute_errors(&payload.clusters, &payload.camera, payload.viewport_height)
            .unwrap_or_else(|err| {
                tracing::warn!(worker = self.id, error = %err, "error computation skipped");
                vec![f64::NAN; payload.clusters.len()]
            });
        Response::ErrorComputationComplete { errors }
    }

    fn simplify(&self, payload: SimplifyGeometry) -> Response {
        let mesh = simplify(&payload.vertices, &payload.indices, payload.target_ratio)
            .unwrap_or_else(|err| {
                tracing::warn!(worker = self.id, error = %err, "malformed mesh, returning empty");
                SimplifiedMesh::default()
            });
        Response::SimplificationComplete(mesh)
    }

    fn frustum_cull(&self, payload: FrustumCull) -> Response {
        let frustum = Frustum::new(payload.frustum_planes);
        Response::FrustumCullComplete(cull_batch(&frustum, &payload.objects))
    }
}
