use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, Encoder, IntGauge, TextEncoder};

pub static AUTH_ATTEMPTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "constitucheck_auth_attempts_total",
        "Session store operations by outcome",
        &["operation", "outcome"]
    )
    .expect("auth attempts metric registers once")
});

pub static GATE_REDIRECTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "constitucheck_gate_redirects_total",
        "Navigations redirected by the auth gate",
        &["target"]
    )
    .expect("gate redirects metric registers once")
});

pub static SESSION_TRANSITIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "constitucheck_session_transitions_total",
        "Session changes broadcast by client stores",
        &["state"]
    )
    .expect("session transitions metric registers once")
});

pub static SIMULATED_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "constitucheck_simulated_operations_total",
        "Simulated page operations started",
        &["kind"]
    )
    .expect("simulated operations metric registers once")
});

pub static LIVE_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("constitucheck_live_clients", "Clients currently tracked")
        .expect("live clients metric registers once")
});

/// Render the default registry in the Prometheus text format.
pub fn render() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_metrics_include_registered_families() {
        GATE_REDIRECTS.with_label_values(&["/auth"]).inc();
        LIVE_CLIENTS.set(LIVE_CLIENTS.get());

        let text = render().unwrap();
        assert!(text.contains("constitucheck_gate_redirects_total"));
        assert!(text.contains("constitucheck_live_clients"));
    }
}
