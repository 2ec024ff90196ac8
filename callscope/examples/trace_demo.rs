//! Demo workload traced end to end.
//!
//! Drives a simulated interpreter through a small "request handling"
//! program and prints every span the engine lets through. The `helper`
//! function and everything under the runtime's library tree stay invisible.
//!
//! Run with: cargo run --example trace_demo

use anyhow::Result;
use std::sync::Arc;

use callscope::backend::{ChannelBackend, SpanEvent, SpanPhase};
use callscope::config::FilterConfig;
use callscope::domain::CodeUnit;
use callscope::host::SimHost;
use callscope::monitor::Tracer;

fn main() -> Result<()> {
    env_logger::init();

    let host = Arc::new(SimHost::new());
    let (backend, spans) = ChannelBackend::bounded(256);

    let config = FilterConfig::new()
        .exclude_name("helper")
        .internal_timers(false)
        .system_path("/usr/lib/py3")
        .frozen_path("<frozen");

    let tracer = Tracer::new(host.clone(), Arc::new(backend), config)?;
    tracer.init_tracing()?;

    println!("🚀 Tracing a simulated request\n");

    let handle_request = CodeUnit::new("handle_request", "/app/server.py");
    let db_query = CodeUnit::new("db_query", "/app/db.py");
    let helper = CodeUnit::new("helper", "/app/util.py");
    let render = CodeUnit::new("render", "/app/views.py");
    let os_join = CodeUnit::new("join", "/usr/lib/py3/posixpath.py");

    host.call(&handle_request, 12, || {
        host.call(&db_query, 31, || {
            host.call(&helper, 58, || {}); // excluded by name
        });
        host.call(&os_join, 44, || {}); // excluded by system path
        host.call(&render, 35, || {});
    });

    if let Some(stats) = tracer.dispatch_stats() {
        println!(
            "stats: entries={} exits={} suppressed={} backend_errors={}\n",
            stats.entries_emitted,
            stats.exits_emitted,
            stats.units_suppressed,
            stats.backend_errors
        );
    }

    tracer.fini_tracing()?;

    let mut depth = 0usize;
    for SpanEvent { phase, name, source_path, line } in spans.try_iter() {
        match phase {
            SpanPhase::Start => {
                println!("{:indent$}▶ {name} ({source_path}:{line})", "", indent = depth * 2);
                depth += 1;
            }
            SpanPhase::Stop => {
                depth = depth.saturating_sub(1);
                println!("{:indent$}◀ {name}", "", indent = depth * 2);
            }
        }
    }

    println!("\n✓ Done (helper and library code produced no spans)");
    Ok(())
}
