#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use credpay::{
    FetchRequest, HostedSettlementClient, PayerIdentity, PaymentProof, PaymentRequirements,
    ResponseBody, SettlementClient, SettlementOutcome,
};
use credpay_server::{AppState, CredpayConfig};

pub const PAY_TO: &str = "0x1111111111111111111111111111111111111111";
pub const PAYER: &str = "0x2222222222222222222222222222222222222222";

/// Config from explicit variables only; the process environment is ignored.
pub fn config(vars: &[(&str, &str)]) -> CredpayConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    CredpayConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
}

/// Every paid route configured, with `WEBSITE_URL` pointing at `website`.
pub fn full_config(website: &str) -> CredpayConfig {
    config(&[
        ("THIRDWEB_SECRET_KEY", "sk_test"),
        ("API_PAYTO_WALLET", PAY_TO),
        ("CREDPAY_PAYER_WALLET", PAYER),
        ("WEBSITE_URL", website),
    ])
}

pub fn state<S: SettlementClient>(config: CredpayConfig, settlement: S) -> web::Data<AppState<S>> {
    web::Data::new(AppState::new(config, settlement))
}

#[derive(Default)]
struct Calls {
    validate: AtomicUsize,
    pay_and_fetch: AtomicUsize,
    requirements: Mutex<Vec<PaymentRequirements>>,
    proofs: Mutex<Vec<Option<String>>>,
    fetches: Mutex<Vec<(PayerIdentity, FetchRequest)>>,
}

/// Scripted settlement client that counts calls.
///
/// `validate` issues a challenge for absent proofs, accepts each listed proof
/// once, and challenges anything else. `pay_and_fetch` pops scripted outcomes.
#[derive(Clone, Default)]
pub struct FakeSettlement {
    calls: Arc<Calls>,
    accepted: Arc<Mutex<HashSet<String>>>,
    validate_override: Arc<Mutex<Option<SettlementOutcome>>>,
    fetch_outcomes: Arc<Mutex<VecDeque<SettlementOutcome>>>,
}

impl FakeSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(self, proof: &str) -> Self {
        self.accepted.lock().unwrap().insert(proof.to_string());
        self
    }

    /// Answer every validation with `outcome`, whatever the proof.
    pub fn validate_with(self, outcome: SettlementOutcome) -> Self {
        *self.validate_override.lock().unwrap() = Some(outcome);
        self
    }

    pub fn fetch_returns(self, outcome: SettlementOutcome) -> Self {
        self.fetch_outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn validate_calls(&self) -> usize {
        self.calls.validate.load(Ordering::SeqCst)
    }

    pub fn pay_and_fetch_calls(&self) -> usize {
        self.calls.pay_and_fetch.load(Ordering::SeqCst)
    }

    pub fn last_requirements(&self) -> Option<PaymentRequirements> {
        self.calls.requirements.lock().unwrap().last().cloned()
    }

    pub fn last_proof(&self) -> Option<Option<String>> {
        self.calls.proofs.lock().unwrap().last().cloned()
    }

    pub fn last_fetch(&self) -> Option<(PayerIdentity, FetchRequest)> {
        self.calls.fetches.lock().unwrap().last().cloned()
    }
}

impl SettlementClient for FakeSettlement {
    async fn validate(
        &self,
        requirements: &PaymentRequirements,
        proof: Option<&PaymentProof>,
    ) -> SettlementOutcome {
        self.calls.validate.fetch_add(1, Ordering::SeqCst);
        self.calls
            .requirements
            .lock()
            .unwrap()
            .push(requirements.clone());
        self.calls
            .proofs
            .lock()
            .unwrap()
            .push(proof.map(|p| p.as_str().to_string()));

        if let Some(outcome) = self.validate_override.lock().unwrap().clone() {
            return outcome;
        }

        let Some(proof) = proof else {
            return HostedSettlementClient::challenge(requirements, "X-PAYMENT header is required");
        };
        if self.accepted.lock().unwrap().remove(proof.as_str()) {
            SettlementOutcome::new(200, ResponseBody::Structured(serde_json::json!({"success": true})))
                .with_header("X-PAYMENT-RESPONSE", format!("receipt-for-{}", proof.as_str()))
        } else {
            HostedSettlementClient::challenge(requirements, "invalid_payment")
        }
    }

    async fn pay_and_fetch(&self, payer: &PayerIdentity, target: &FetchRequest) -> SettlementOutcome {
        self.calls.pay_and_fetch.fetch_add(1, Ordering::SeqCst);
        self.calls
            .fetches
            .lock()
            .unwrap()
            .push((payer.clone(), target.clone()));

        self.fetch_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| SettlementOutcome::provider_error(500, "no scripted outcome"))
    }
}
