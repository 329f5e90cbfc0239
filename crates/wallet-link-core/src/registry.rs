use crate::domain::WalletDescriptor;
use crate::ports::WalletAdapter;

/// Fixed list of supported wallets, in registration order.
///
/// Installation is probed on every query; nothing is cached between calls.
/// When two adapters probe the same injection point, the first registered
/// one claims it and later ones report not installed.
pub struct WalletRegistry<A> {
    adapters: Vec<A>,
}

impl<A: WalletAdapter> WalletRegistry<A> {
    pub fn new(adapters: Vec<A>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &[A] {
        &self.adapters
    }

    pub fn get_all_wallets(&self) -> impl Iterator<Item = WalletDescriptor> + '_ {
        (0..self.adapters.len()).map(move |idx| self.describe(idx))
    }

    pub fn get_installed_wallets(&self) -> impl Iterator<Item = WalletDescriptor> + '_ {
        self.get_all_wallets().filter(|w| w.installed)
    }

    pub fn get_not_installed_wallets(&self) -> impl Iterator<Item = WalletDescriptor> + '_ {
        self.get_all_wallets().filter(|w| !w.installed)
    }

    pub fn get_wallet_by_name(&self, name: &str) -> Option<&A> {
        self.adapters.iter().find(|a| a.name() == name)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.adapters
            .iter()
            .position(|a| a.name() == name)
            .is_some_and(|idx| self.claims_injection(idx))
    }

    fn describe(&self, idx: usize) -> WalletDescriptor {
        let adapter = &self.adapters[idx];
        WalletDescriptor {
            name: adapter.name().to_owned(),
            icon_ref: adapter.icon_ref().to_owned(),
            install_url: adapter.install_url().to_owned(),
            installed: self.claims_injection(idx),
        }
    }

    fn claims_injection(&self, idx: usize) -> bool {
        let adapter = &self.adapters[idx];
        if !adapter.installed() {
            return false;
        }
        let key = adapter.injection_key();
        !self.adapters[..idx]
            .iter()
            .any(|earlier| earlier.injection_key() == key && earlier.installed())
    }
}
