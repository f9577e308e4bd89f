use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use innkeeper::api::types::Credentials;
use innkeeper::api::ApiClient;
use innkeeper::auth::Auth;
use innkeeper::cache::{QueryClient, QueryState};
use innkeeper::config::Config;
use innkeeper::nav::NoopNavigator;
use innkeeper::notify::ConsoleNotifier;
use innkeeper::params::ListParams;
use innkeeper::resources::checkin::CheckIn;
use innkeeper::resources::{Bookings, Cabins, CheckInOut};

#[derive(Parser, Debug)]
#[command(name = "innkeeper")]
#[command(about = "Admin client for a small hospitality booking operation")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/innkeeper/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List bookings
  Bookings {
    /// Filter by status: unconfirmed, checked-in, checked-out or all
    #[arg(long)]
    status: Option<String>,
    /// Sort order, e.g. startDate-desc or totalPrice-asc
    #[arg(long = "sort-by")]
    sort_by: Option<String>,
    /// Page number
    #[arg(long)]
    page: Option<String>,
  },
  /// Show a single booking
  Booking { id: i64 },
  /// List cabins
  Cabins,
  /// Check a booking in
  Checkin { id: i64 },
  /// Check a booking out
  Checkout { id: i64 },
  /// Delete a booking
  DeleteBooking { id: i64 },
  /// Verify credentials against the API
  Login {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// End the current API session
  Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing()?;

  let config = Config::load(args.config.as_deref())?;
  let api = Arc::new(ApiClient::new(&config)?);
  let client = QueryClient::new();
  let notifier = Arc::new(ConsoleNotifier);
  let navigator = Arc::new(NoopNavigator);

  match args.command {
    Command::Bookings {
      status,
      sort_by,
      page,
    } => {
      let bookings = Bookings::new(client, api, notifier);
      let params = ListParams::from_raw(status.as_deref(), sort_by.as_deref(), page.as_deref());
      let mut handle = bookings.list(&params);
      match handle.settled().await {
        QueryState::Success(page_data) => {
          println!("{} bookings total", page_data.count);
          for booking in page_data.bookings {
            let guest = booking
              .guest
              .map(|g| g.full_name)
              .unwrap_or_else(|| "-".to_string());
            println!(
              "#{:<6} {}  {:<12} {:>8.2}  {}",
              booking.id,
              booking.start_date.format("%Y-%m-%d"),
              booking.status.as_str(),
              booking.total_price,
              guest
            );
          }
        }
        QueryState::Error(e) => return Err(eyre!(e)),
        _ => {}
      }
    }
    Command::Booking { id } => {
      let bookings = Bookings::new(client, api, notifier);
      match bookings.detail(id).settled().await {
        QueryState::Success(booking) => {
          println!("Booking #{}", booking.id);
          println!(
            "  {} -> {} ({} nights, {} guests)",
            booking.start_date.format("%Y-%m-%d"),
            booking.end_date.format("%Y-%m-%d"),
            booking.num_nights,
            booking.num_guests
          );
          println!("  status: {}", booking.status.as_str());
          println!("  total:  {:.2}", booking.total_price);
          if let Some(observations) = booking.observations {
            println!("  notes:  {}", observations);
          }
        }
        QueryState::Error(e) => return Err(eyre!(e)),
        _ => {}
      }
    }
    Command::Cabins => {
      let cabins = Cabins::new(client, api, notifier);
      match cabins.list().settled().await {
        QueryState::Success(rows) => {
          for cabin in rows {
            println!(
              "{:<10} capacity {:<3} price {:>8.2} discount {:>6.2}",
              cabin.name, cabin.max_capacity, cabin.regular_price, cabin.discount
            );
          }
        }
        QueryState::Error(e) => return Err(eyre!(e)),
        _ => {}
      }
    }
    Command::Checkin { id } => {
      let checkin = CheckInOut::new(client, api, notifier, navigator);
      let _ = checkin
        .check_in()
        .mutate(CheckIn {
          booking_id: id,
          breakfast: None,
        })
        .await;
    }
    Command::Checkout { id } => {
      let checkin = CheckInOut::new(client, api, notifier, navigator);
      let _ = checkin.check_out().mutate(id).await;
    }
    Command::DeleteBooking { id } => {
      let bookings = Bookings::new(client, api, notifier);
      let _ = bookings.delete().mutate(id).await;
    }
    Command::Login { email, password } => {
      let auth = Auth::new(client, api, notifier, navigator);
      if auth
        .login()
        .mutate(Credentials { email, password })
        .await
        .is_ok()
      {
        println!("Logged in");
      }
    }
    Command::Logout => {
      let auth = Auth::new(client, api, notifier, navigator);
      if auth.logout().mutate(()).await.is_ok() {
        println!("Logged out");
      }
    }
  }

  Ok(())
}

fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("innkeeper");
  std::fs::create_dir_all(&dir).map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let file = tracing_appender::rolling::never(&dir, "innkeeper.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
