//! Basic usage example for GenieOTP.
//!
//! Seeds an in-memory store with one user and one service, buys a number
//! from 5sim, waits for the SMS code and refunds the order if none arrives.
//!
//! # Running
//!
//! ```bash
//! FIVESIM_API_KEY=your_api_key cargo run --example basic_usage
//! ```

use genie_otp::five_sim::{FiveSim, FiveSimProvider};
use genie_otp::{
    CancelRequest, MemoryStore, NumberRequest, OtpService, OtpServiceError, OtpServiceTrait,
    Service, SmsRetryableProvider, User, UserId,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const UID: &str = "demo-user";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reads FIVESIM_API_KEY (and FIVESIM_API_URL if set)
    let client = FiveSim::from_env()?;

    // Retry status checks on transient failures
    let provider = SmsRetryableProvider::new(FiveSimProvider::new(client));

    let store = MemoryStore::with_data(
        [User::new(UID, "demo@example.com", 100)],
        [Service::new("WhatsApp", "whatsapp", 50, ["pakistan", "india"])],
    );

    let service = OtpService::builder(provider, store)
        .timeout(Duration::from_secs(180))
        .poll_interval(Duration::from_secs(5))
        .build();

    let catalog = service.catalog().await?;
    for entry in &catalog {
        println!("{}: {} coins ({} countries)", entry.name, entry.price, entry.countries.len());
    }

    println!("\nRequesting a WhatsApp number in Pakistan...");
    let order = service
        .acquire_number(&NumberRequest::new("WhatsApp", "pakistan", UID))
        .await?;

    println!("Got phone number:");
    println!("  Order ID: {}", order.order_id);
    println!("  Full number: {}", order.phone);
    if let (Some(dial_code), Some(number)) = (&order.dial_code, &order.number) {
        println!("  Dial code: +{dial_code}");
        println!("  Number: {number}");
    }
    println!("  Balance: {} coins", order.new_balance);

    println!("\nWaiting for SMS code...");
    match service.wait_for_sms(&order, &CancellationToken::new()).await {
        Ok(code) => println!("Received code: {code}"),
        Err(e @ (OtpServiceError::SmsTimeout { .. } | OtpServiceError::OrderFailed { .. })) => {
            println!("{e}");
            let outcome = service
                .cancel_order(&CancelRequest::new(order.order_id, UID, order.cost))
                .await?;
            println!("{}", outcome.message);
        }
        Err(e) => return Err(e.into()),
    }

    for log in service.order_history(&UserId::from(UID)).await? {
        println!("{} {} {} {}", log.order_id, log.service, log.number, log.status);
    }

    Ok(())
}
