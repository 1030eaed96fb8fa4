use tracing::{Event, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "warn,prize_wheel=info,prize_wheel_server=info,tower_http=warn";

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }
}

/// One line per event: local timestamp, level, target, message.
struct WheelLogLayer;

impl<S: Subscriber> Layer<S> for WheelLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.0.is_empty() {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match metadata.level().as_str() {
            "ERROR" => eprintln!("[{}] ERROR {} - {}", timestamp, metadata.target(), visitor.0),
            "WARN" => eprintln!("[{}] WARN {} - {}", timestamp, metadata.target(), visitor.0),
            level => println!("[{}] {} {} - {}", timestamp, level, metadata.target(), visitor.0),
        }
    }
}

/// Installs the global subscriber. `log` records from the engine crate are
/// bridged into it.
pub fn setup() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = Registry::default().with(env_filter).with(WheelLogLayer);

    if let Err(e) = subscriber.try_init() {
        eprintln!("Logging already initialised: {}", e);
    }
}
