use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use clap::Args;
use contrat_ai::error::AppError;
use contrat_ai::review::{
    Analyzer, AssistantBackend, ConfidenceScorer, ContractReviewScheduler, ContractReviewService,
    ContractSubmission, EnergyType, ResponseInterpreter, ReviewConfig, SimulatedAssistant,
};

use crate::infra::{InMemoryContractStore, InMemoryDecisionStore};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Use the simulated assistant backend instead of the rule analyzer
    #[arg(long)]
    pub(crate) assistant: bool,
    /// Seed for the confidence perturbation, for reproducible output
    #[arg(long, default_value_t = 7)]
    pub(crate) seed: u64,
}

fn sample_submissions() -> Vec<(&'static str, ContractSubmission)> {
    let now = Utc::now();
    let base = ContractSubmission {
        reference: String::new(),
        email: "claire.martin@example.com".to_string(),
        telephone: "0145020304".to_string(),
        delivery_street: "12 rue Victor Hugo".to_string(),
        delivery_postal_code: "75015".to_string(),
        delivery_city: "Paris".to_string(),
        energy_type: EnergyType::Electricite,
        consent: true,
        signed_at: Some(now - ChronoDuration::days(1)),
        service_start: Some(now + ChronoDuration::days(7)),
        price: 89.90,
    };

    let conforming = ContractSubmission {
        reference: "CNT-DEMO-001".to_string(),
        ..base.clone()
    };
    let no_consent = ContractSubmission {
        reference: "CNT-DEMO-002".to_string(),
        consent: false,
        ..base.clone()
    };
    let disposable_email = ContractSubmission {
        reference: "CNT-DEMO-003".to_string(),
        email: "jean@yopmail.com".to_string(),
        ..base.clone()
    };
    let wrong_city = ContractSubmission {
        reference: "CNT-DEMO-004".to_string(),
        delivery_city: "Marseille".to_string(),
        ..base.clone()
    };
    let cheap_mobile = ContractSubmission {
        reference: "CNT-DEMO-005".to_string(),
        email: "test.client@example.com".to_string(),
        telephone: "0601020304".to_string(),
        price: 19.90,
        ..base
    };

    vec![
        ("contrat conforme", conforming),
        ("consentement manquant", no_consent),
        ("email jetable", disposable_email),
        ("code postal / ville incohérents", wrong_city),
        ("signaux faibles cumulés", cheap_mobile),
    ]
}

/// End-to-end walkthrough on in-memory stores: submit a batch of sample
/// contracts, drain the queue once, and print the audit trail.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let analyzer = if args.assistant {
        Analyzer::AssistantBacked {
            backend: AssistantBackend::Simulated(SimulatedAssistant::seeded(args.seed)),
            interpreter: ResponseInterpreter,
        }
    } else {
        Analyzer::RuleBased {
            scorer: ConfidenceScorer::seeded(args.seed),
        }
    };

    let contracts = Arc::new(InMemoryContractStore::default());
    let decisions = Arc::new(InMemoryDecisionStore::default());
    let service = Arc::new(ContractReviewService::new(
        Arc::clone(&contracts),
        Arc::clone(&decisions),
        analyzer,
        ReviewConfig::default(),
    ));

    println!("== Dépôt des demandes ==");
    let mut enqueued = Vec::new();
    for (label, submission) in sample_submissions() {
        let reference = submission.reference.clone();
        let (contract, result, verdict) = service.submit(submission, Utc::now()).await?;
        println!(
            "  {reference} ({label}): verdict {} — {} [{}] conf {:.2}",
            verdict.label(),
            result.decision.label(),
            result.motif_code.label(),
            result.confidence,
        );
        if let Some(contract) = contract {
            enqueued.push(contract.id);
        }
    }

    println!("\n== Passage du planificateur ==");
    let scheduler = ContractReviewScheduler::new(Arc::clone(&service), Duration::from_secs(30));
    let summary = scheduler.run_once().await.map_err(AppError::from)?;
    println!(
        "  {} traité(s), {} en erreur",
        summary.processed, summary.failed
    );

    println!("\n== Journal des décisions ==");
    for id in &enqueued {
        if let Some(record) = service.latest_decision(id)? {
            println!(
                "  {}: {} [{}] action {} conf {:.2} ({})",
                id.0,
                record.result.decision.label(),
                record.result.motif_code.label(),
                record.result.action_conseiller.label(),
                record.result.confidence,
                record.process_status.label(),
            );
        }
    }

    Ok(())
}
