use credpay_client::{CredpayDemo, FlowState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

fn print_state(state: &FlowState) {
    match state {
        FlowState::Blocked { challenge } => {
            println!("402 Payment Required. Challenge returned by the API:");
            println!("{challenge}");
        }
        FlowState::Success { payload, payer } => {
            println!("Result:");
            println!(
                "{}",
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
            );
            if let Some(payer) = payer {
                if let Some(ref url) = payer.explorer_url {
                    println!("View transaction: {url} (payer: {})", payer.payer_address);
                }
            }
        }
        FlowState::Error { status, body } => {
            match status {
                Some(status) => println!("Failed with status {status}:"),
                None => println!("Failed:"),
            }
            println!("{body}");
        }
        FlowState::Idle | FlowState::Calling | FlowState::Paying { .. } => {}
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CREDPAY_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let mut demo = match CredpayDemo::new(&base_url) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Credpay x402 demo against {}", demo.premium_url());

    let outcome = async {
        print_state(demo.call_resource().await?);
        if demo.state().is_blocked() {
            print_state(demo.pay().await?);
        }
        Ok::<_, credpay_client::ClientError>(())
    }
    .await;

    println!();
    for line in demo.log().lines() {
        println!("{line}");
    }

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if matches!(demo.state(), FlowState::Error { .. }) {
        std::process::exit(2);
    }
}
