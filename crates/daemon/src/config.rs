use std::net::SocketAddr;

use fleetsim_core::sim::StepParams;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,
    /// SurrealDB endpoint, e.g. `surrealkv://.fleetsim/db` or `mem://`.
    pub db_endpoint: String,
    pub step: StepParams,
}
