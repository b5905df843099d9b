// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Optional OpenTelemetry instrumentation, compiled in behind the
//! `telemetry` feature and disabled at runtime until [`enable`] is called.

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::KeyValue;

    const METER_NAME: &str = "xtmpl_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        render_hist: Histogram<f64>,
        render_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let render_hist = meter
                .f64_histogram("xtmpl.render.duration_ms")
                .with_description("Render duration in milliseconds")
                .init();
            let render_counter = meter
                .u64_counter("xtmpl.render.count")
                .with_description("Number of template renders")
                .init();
            Self {
                render_hist,
                render_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    /// Turns metric recording on.
    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    /// Turns metric recording off.
    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    pub(crate) fn record_render(template_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let attrs = [
            KeyValue::new("template.length", template_len as i64),
            KeyValue::new("render.success", success),
        ];
        hs.render_counter.add(1, &attrs);
        hs.render_hist
            .record(duration.as_secs_f64() * 1_000.0, &attrs);
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    /// Turns metric recording on (no-op without the `telemetry` feature).
    pub fn enable() {}

    /// Turns metric recording off (no-op without the `telemetry` feature).
    pub fn disable() {}

    pub(crate) fn record_render(_template_len: usize, _duration: Duration, _success: bool) {}
}

pub use otel::{disable, enable};
pub(crate) use otel::record_render;
