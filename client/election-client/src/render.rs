use ethers_core::types::Address;
use ethers_core::utils::to_checksum;
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::{ClientError, ElectionSession};

impl ElectionSession {
    /// Re-fetches the election and rebuilds the view model.
    ///
    /// Errors are logged and swallowed. A failed render leaves the loader
    /// visible and the content hidden.
    pub async fn render(&self) {
        self.update_view(|view| view.show_loader());

        match self.contract().coinbase().await {
            Ok(coinbase) => {
                let account = self.adopt_account(coinbase);
                self.update_view(|view| {
                    view.account_display =
                        Some(format!("Your Account: {}", to_checksum(&account, None)));
                });
            }
            Err(err) => warn!(%err, "Unable to read the coinbase account"),
        }

        if let Err(err) = self.refresh().await {
            warn!(%err, "Unable to render the election");
        }
    }

    async fn refresh(&self) -> Result<(), ClientError> {
        let contract = self.contract();
        let count = contract.candidates_count().await?;
        debug!(count, "Fetching candidates");
        let candidates = try_join_all((1..=count).map(|index| contract.candidate(index))).await?;
        self.update_view(|view| view.show_candidates(candidates));

        // An unknown account reads as the zero address, which never voted.
        let account = self.account().unwrap_or_else(Address::zero);
        if contract.voters(account).await? {
            self.update_view(|view| view.forms_visible = false);
        }

        self.update_view(|view| view.show_content());
        Ok(())
    }
}
