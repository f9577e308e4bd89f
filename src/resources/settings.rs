//! Operation-wide settings.

use std::sync::Arc;

use crate::api::types::{Setting, SettingUpdate};
use crate::api::SettingsGateway;
use crate::cache::{KeyPrefix, QueryClient, QueryHandle, QueryKey};
use crate::mutation::Mutation;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct Settings {
  client: QueryClient,
  gateway: Arc<dyn SettingsGateway>,
  notifier: Arc<dyn Notifier>,
}

impl Settings {
  pub fn new(
    client: QueryClient,
    gateway: Arc<dyn SettingsGateway>,
    notifier: Arc<dyn Notifier>,
  ) -> Self {
    Self {
      client,
      gateway,
      notifier,
    }
  }

  pub fn get(&self) -> QueryHandle<Setting> {
    let gateway = Arc::clone(&self.gateway);
    self.client.subscribe(QueryKey::Settings, move || {
      let gateway = Arc::clone(&gateway);
      async move { gateway.settings().await.map_err(|e| e.to_string()) }
    })
  }

  pub fn update(&self) -> Mutation<SettingUpdate, Setting> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let success_notifier = Arc::clone(&self.notifier);
    let error_notifier = Arc::clone(&self.notifier);

    Mutation::new(move |update: SettingUpdate| {
      let gateway = Arc::clone(&gateway);
      async move { gateway.update_setting(update).await.map_err(|e| e.to_string()) }
    })
    .on_success(move |_| {
      client.invalidate(KeyPrefix::Settings);
      success_notifier.success("Setting successfully edited");
    })
    .on_error(move |e| error_notifier.error(e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notify::doubles::RecordingNotifier;
  use async_trait::async_trait;
  use color_eyre::{eyre::eyre, Result};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn sample_setting() -> Setting {
    Setting {
      min_booking_length: 3,
      max_booking_length: 30,
      max_guests_per_booking: 8,
      breakfast_price: 15.0,
    }
  }

  #[derive(Default)]
  struct MockGateway {
    reads: AtomicU32,
    fail_update: bool,
  }

  #[async_trait]
  impl SettingsGateway for MockGateway {
    async fn settings(&self) -> Result<Setting> {
      self.reads.fetch_add(1, Ordering::SeqCst);
      Ok(sample_setting())
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<Setting> {
      if self.fail_update {
        return Err(eyre!("Settings could not be updated"));
      }
      Ok(Setting {
        breakfast_price: update.breakfast_price.unwrap_or(15.0),
        ..sample_setting()
      })
    }
  }

  fn setup(gateway: MockGateway) -> (Settings, Arc<MockGateway>, Arc<RecordingNotifier>) {
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = Settings::new(
      QueryClient::new(),
      Arc::clone(&gateway) as Arc<dyn SettingsGateway>,
      Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    (settings, gateway, notifier)
  }

  #[tokio::test]
  async fn update_notifies_and_refetches_the_settings_query() {
    let (settings, gateway, notifier) = setup(MockGateway::default());

    let mut handle = settings.get();
    assert_eq!(handle.key(), &QueryKey::Settings);
    handle.settled().await;

    settings
      .update()
      .mutate(SettingUpdate {
        breakfast_price: Some(20.0),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(
      *notifier.successes.lock(),
      vec!["Setting successfully edited".to_string()]
    );
    for _ in 0..50 {
      if gateway.reads.load(Ordering::SeqCst) == 2 {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(gateway.reads.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn update_failure_surfaces_the_gateway_message() {
    let (settings, _, notifier) = setup(MockGateway {
      fail_update: true,
      ..Default::default()
    });

    let result = settings.update().mutate(SettingUpdate::default()).await;

    assert!(result.is_err());
    assert_eq!(
      *notifier.errors.lock(),
      vec!["Settings could not be updated".to_string()]
    );
  }
}
