//! Cancellation example for GenieOTP.
//!
//! Waits for an SMS code until Ctrl+C, then cancels the order at 5sim and
//! refunds its cost.
//!
//! # Running
//!
//! ```bash
//! FIVESIM_API_KEY=your_api_key cargo run --example with_cancellation
//! ```

use genie_otp::five_sim::{FiveSim, FiveSimProvider};
use genie_otp::{
    CancelRequest, MemoryStore, NumberRequest, OtpService, OtpServiceError, OtpServiceTrait,
    Service, User, UserId,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider = FiveSimProvider::new(FiveSim::from_env()?);
    let store = MemoryStore::with_data(
        [User::new("demo-user", "demo@example.com", 100)],
        [Service::new("Telegram", "telegram", 40, ["england"])],
    );
    let service = OtpService::builder(provider, store).build();
    let uid = UserId::from("demo-user");

    let order = service
        .acquire_number(&NumberRequest::new("Telegram", "england", uid.clone()))
        .await?;
    println!("Got {} (order {}), press Ctrl+C to cancel", order.phone, order.order_id);

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match service.wait_for_sms(&order, &token).await {
        Ok(code) => println!("Received code: {code}"),
        Err(OtpServiceError::Cancelled { poll_count, .. }) => {
            println!("Stopped after {poll_count} checks, cancelling...");
            let outcome = service
                .cancel_order(&CancelRequest::from((&order, &uid)))
                .await?;
            println!("{} Balance: {} coins", outcome.message, outcome.new_balance);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
