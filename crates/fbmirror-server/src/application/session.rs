//! SessionHandler: what happens when a viewer authenticates, types, taps or
//! leaves.
//!
//! Owns the authorization table and the input injector, so every rights
//! lookup and every table mutation goes through one place:
//!
//! | Transport callback | Table          | Injector                  |
//! |--------------------|----------------|---------------------------|
//! | authenticate       | `admit`        | –                         |
//! | key                | `rights` (read)| `key`                     |
//! | pointer            | `rights` (read)| `pointer`                 |
//! | disconnect         | `release`      | `forget_client`           |

use std::time::Instant;

use fbmirror_core::{
    AuthError, AuthorizationTable, ClientId, CredentialSet, InputInjector, KeyOutcome,
    PointerOutcome,
};
use tracing::{debug, info, warn};

use crate::infrastructure::transport::AuthVerdict;

#[derive(Debug)]
pub struct SessionHandler {
    injector: InputInjector,
    table: AuthorizationTable,
    credentials: CredentialSet,
}

impl SessionHandler {
    pub fn new(injector: InputInjector, credentials: CredentialSet, capacity: usize) -> Self {
        if credentials.is_empty() {
            warn!("no credentials configured; every viewer will be rejected");
        }
        Self {
            injector,
            table: AuthorizationTable::new(capacity),
            credentials,
        }
    }

    pub fn table(&self) -> &AuthorizationTable {
        &self.table
    }

    pub fn injector(&self) -> &InputInjector {
        &self.injector
    }

    /// Checks `client`'s response against each configured password in
    /// order and admits it with the first matching tier.
    ///
    /// A rejected attempt leaves no state behind.
    pub fn authenticate(
        &mut self,
        client: ClientId,
        verifies: &mut dyn FnMut(&str) -> bool,
    ) -> AuthVerdict {
        let Some(tier) = self.credentials.match_response(verifies) else {
            info!("client {client} rejected: no password matched");
            return AuthVerdict::Reject;
        };

        match self.table.admit(client, tier) {
            Ok(admission) => {
                if admission.replaced {
                    debug!("client {client} re-authenticated");
                }
                info!(
                    "client {client} authenticated as {tier:?} ({}/{} slots)",
                    self.table.len(),
                    self.table.capacity()
                );
                AuthVerdict::Accept {
                    view_only: admission.view_only,
                }
            }
            Err(e) => {
                warn!("client {client} rejected: {e}");
                AuthVerdict::Reject
            }
        }
    }

    pub fn key(&mut self, client: ClientId, symbol: u32, down: bool, at: Instant) -> KeyOutcome {
        self.injector.key(symbol, down, client, &self.table, at)
    }

    pub fn pointer(&mut self, client: ClientId, button_mask: u8, x: i32, y: i32) -> PointerOutcome {
        self.injector.pointer(button_mask, x, y, client, &self.table)
    }

    /// Frees `client`'s slot.
    pub fn disconnect(&mut self, client: ClientId) {
        match self.table.release(client) {
            Ok(tier) => info!("client {client} ({tier:?}) disconnected"),
            Err(AuthError::UnknownClient(_)) => debug!("disconnect from unadmitted client {client}"),
            Err(e) => warn!("disconnect of {client}: {e}"),
        }
        self.injector.forget_client(client);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fbmirror_core::input::DropReason;
    use fbmirror_core::keymap::{evdev, keysym, SYSTEM_MENU_KEYSYM};
    use fbmirror_core::{
        Credential, InjectorConfig, InputEvent, InputSink, MockInputSink, RightsTier,
    };
    use uuid::Uuid;

    fn make_handler(capacity: usize) -> (SessionHandler, Arc<MockInputSink>) {
        let keyboard = Arc::new(MockInputSink::new());
        let injector = InputInjector::new(InjectorConfig::default())
            .with_keyboard(Arc::clone(&keyboard) as Arc<dyn InputSink>);
        let credentials = CredentialSet::new(vec![
            Credential { password: "look".into(), tier: RightsTier::ViewOnly },
            Credential { password: "use".into(), tier: RightsTier::Operate },
            Credential { password: "own".into(), tier: RightsTier::Admin },
        ]);
        (SessionHandler::new(injector, credentials, capacity), keyboard)
    }

    fn login(handler: &mut SessionHandler, password: &str) -> (ClientId, AuthVerdict) {
        let client = Uuid::new_v4();
        let verdict = handler.authenticate(client, &mut |candidate: &str| candidate == password);
        (client, verdict)
    }

    // ── Authentication ────────────────────────────────────────────────────────

    #[test]
    fn test_authenticate_maps_password_to_tier() {
        // Arrange
        let (mut handler, _) = make_handler(4);

        // Act
        let (viewer, v1) = login(&mut handler, "look");
        let (admin, v2) = login(&mut handler, "own");

        // Assert
        assert_eq!(v1, AuthVerdict::Accept { view_only: true });
        assert_eq!(v2, AuthVerdict::Accept { view_only: false });
        assert_eq!(handler.table().rights(viewer), Some(RightsTier::ViewOnly));
        assert_eq!(handler.table().rights(admin), Some(RightsTier::Admin));
    }

    #[test]
    fn test_wrong_password_is_rejected_without_state() {
        let (mut handler, _) = make_handler(4);

        let (_, verdict) = login(&mut handler, "guess");

        assert_eq!(verdict, AuthVerdict::Reject);
        assert!(handler.table().is_empty());
    }

    #[test]
    fn test_full_table_rejects_new_client() {
        let (mut handler, _) = make_handler(1);
        login(&mut handler, "use");

        let (_, verdict) = login(&mut handler, "own");

        assert_eq!(verdict, AuthVerdict::Reject);
        assert_eq!(handler.table().len(), 1);
    }

    #[test]
    fn test_no_credentials_rejects_everyone() {
        let handler_injector = InputInjector::new(InjectorConfig::default());
        let mut handler = SessionHandler::new(handler_injector, CredentialSet::default(), 4);

        let (_, verdict) = login(&mut handler, "");

        assert_eq!(verdict, AuthVerdict::Reject);
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_operator_key_reaches_keyboard() {
        // Arrange
        let (mut handler, keyboard) = make_handler(4);
        let (client, _) = login(&mut handler, "use");

        // Act
        let outcome = handler.key(client, keysym::XK_RETURN, true, Instant::now());

        // Assert
        assert_eq!(outcome, KeyOutcome::Injected { code: evdev::KEY_ENTER, refresh: false });
        assert_eq!(
            keyboard.recorded(),
            vec![InputEvent::key(evdev::KEY_ENTER, true), InputEvent::sync()]
        );
    }

    #[test]
    fn test_operator_system_menu_is_discarded() {
        let (mut handler, keyboard) = make_handler(4);
        let (client, _) = login(&mut handler, "use");

        let outcome = handler.key(client, SYSTEM_MENU_KEYSYM, true, Instant::now());

        assert_eq!(outcome, KeyOutcome::Dropped(DropReason::NotPermitted));
        assert!(keyboard.recorded().is_empty());
    }

    #[test]
    fn test_input_after_disconnect_is_dropped() {
        // Arrange
        let (mut handler, keyboard) = make_handler(4);
        let (client, _) = login(&mut handler, "own");

        // Act
        handler.disconnect(client);
        let outcome = handler.key(client, keysym::XK_ESCAPE, true, Instant::now());

        // Assert
        assert_eq!(outcome, KeyOutcome::Dropped(DropReason::NotPermitted));
        assert!(keyboard.recorded().is_empty());
        assert!(handler.table().is_empty());
    }

    #[test]
    fn test_reconnect_cycles_never_exhaust_table() {
        let (mut handler, _) = make_handler(2);

        for _ in 0..50 {
            let (client, verdict) = login(&mut handler, "use");
            assert_eq!(verdict, AuthVerdict::Accept { view_only: false });
            handler.disconnect(client);
        }

        assert!(handler.table().is_empty());
    }

    #[test]
    fn test_pointer_without_touch_device_reports_no_device() {
        let (mut handler, _) = make_handler(4);
        let (client, _) = login(&mut handler, "use");

        let outcome = handler.pointer(client, 1, 10, 10);

        assert_eq!(outcome, PointerOutcome::Dropped(DropReason::NoDevice));
    }
}
