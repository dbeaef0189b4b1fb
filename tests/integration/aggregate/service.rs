//! Integration tests for the aggregate completion verifier.

use meridian_sdk::{
	models::{
		Cosignature, InnerTransaction, NetworkProperties, Transaction, TransactionType,
	},
	repositories::RepositoryError,
	services::aggregate::{AggregateVerifier, VerifierError},
};

use crate::integration::mocks::{
	graph_of, multisig_info, test_address, MockNetworkRepo, StaticMultisigRepository,
};

fn cosignature_by(tag: char) -> Cosignature {
	Cosignature {
		signer_address: test_address(tag),
		signature: "00".to_string(),
		version: 0,
	}
}

fn inner_signed_by(tag: char) -> InnerTransaction {
	InnerTransaction {
		transaction_type: TransactionType::Transfer,
		signer_address: test_address(tag),
		recipient_address: None,
		address_additions: vec![],
		address_deletions: vec![],
	}
}

fn aggregate(
	signer: Option<char>,
	cosigners: &[char],
	inner: Vec<InnerTransaction>,
) -> Transaction {
	Transaction {
		transaction_type: TransactionType::AggregateComplete,
		signer_address: signer.map(test_address),
		recipient_address: None,
		transactions: inner,
		cosignatures: cosigners.iter().map(|&tag| cosignature_by(tag)).collect(),
		address_additions: vec![],
		address_deletions: vec![],
	}
}

fn network_repo() -> MockNetworkRepo {
	let mut repo = MockNetworkRepo::new();
	repo.expect_network_properties()
		.returning(|| Ok(NetworkProperties::default()));
	repo
}

/// An account that exists in the multisig tables as an ordinary account.
fn ordinary(tag: char) -> meridian_sdk::models::MultisigAccountInfo {
	multisig_info(&test_address(tag), 0, 0, &[], &[])
}

#[tokio::test]
async fn test_ordinary_signer_must_be_in_the_signer_set() {
	let multisig = StaticMultisigRepository::new().with_info(ordinary('S'));
	let verifier = AggregateVerifier::new(multisig, network_repo());

	let signed = aggregate(Some('S'), &[], vec![inner_signed_by('S')]);
	assert!(verifier.is_complete(&signed).await.unwrap());

	let multisig = StaticMultisigRepository::new().with_info(ordinary('S'));
	let verifier = AggregateVerifier::new(multisig, network_repo());
	let unsigned = aggregate(Some('X'), &[], vec![inner_signed_by('S')]);
	assert!(!verifier.is_complete(&unsigned).await.unwrap());
}

#[tokio::test]
async fn test_two_of_two_multisig_needs_both_cosigners() {
	let m = test_address('M');
	let a = test_address('A');
	let b = test_address('B');
	let build = || {
		StaticMultisigRepository::new()
			.with_info(multisig_info(&m, 2, 2, &[&a, &b], &[]))
			.with_graph(
				&m,
				graph_of(vec![(0, vec![multisig_info(&m, 2, 2, &[&a, &b], &[])])]),
			)
	};

	let verifier = AggregateVerifier::new(build(), network_repo());
	let complete = aggregate(Some('A'), &['B'], vec![inner_signed_by('M')]);
	assert!(verifier.is_complete(&complete).await.unwrap());

	let verifier = AggregateVerifier::new(build(), network_repo());
	let short = aggregate(Some('A'), &[], vec![inner_signed_by('M')]);
	assert!(!verifier.is_complete(&short).await.unwrap());
}

#[tokio::test]
async fn test_nested_multisig_approval_propagates_upward() {
	// M2 is 2-of-{M1, A1}; M1 is 1-of-{A2, A3}
	let m2 = test_address('2');
	let m1 = test_address('3');
	let a1 = test_address('A');
	let a2 = test_address('B');
	let a3 = test_address('C');
	let build = || {
		StaticMultisigRepository::new()
			.with_info(multisig_info(&m2, 2, 2, &[&m1, &a1], &[]))
			.with_graph(
				&m2,
				graph_of(vec![
					(0, vec![multisig_info(&m2, 2, 2, &[&m1, &a1], &[])]),
					(1, vec![multisig_info(&m1, 1, 1, &[&a2, &a3], &[])]),
				]),
			)
	};

	// {A1, A2}: A2 satisfies M1, M1 then joins A1 to satisfy M2
	let verifier = AggregateVerifier::new(build(), network_repo());
	let complete = aggregate(Some('A'), &['B'], vec![inner_signed_by('2')]);
	assert!(verifier.is_complete(&complete).await.unwrap());

	// {A1} alone: M1 unmet, so M2 stays one signature short
	let verifier = AggregateVerifier::new(build(), network_repo());
	let short = aggregate(Some('A'), &[], vec![inner_signed_by('2')]);
	assert!(!verifier.is_complete(&short).await.unwrap());
}

#[tokio::test]
async fn test_cosignatory_removal_checks_the_removal_threshold() {
	let m = test_address('M');
	let a = test_address('A');
	let b = test_address('B');
	let multisig = StaticMultisigRepository::new()
		.with_info(multisig_info(&m, 2, 1, &[&a, &b], &[]))
		.with_graph(
			&m,
			graph_of(vec![(0, vec![multisig_info(&m, 2, 1, &[&a, &b], &[])])]),
		);
	let verifier = AggregateVerifier::new(multisig, network_repo());

	// One signature: short of min_approval=2 but enough for min_removal=1
	let removal = Transaction {
		transactions: vec![InnerTransaction {
			transaction_type: TransactionType::MultisigAccountModification,
			signer_address: m.clone(),
			recipient_address: None,
			address_additions: vec![],
			address_deletions: vec![b.clone().into()],
		}],
		..aggregate(Some('A'), &[], vec![])
	};
	assert!(verifier.is_complete(&removal).await.unwrap());

	let addition = Transaction {
		transactions: vec![InnerTransaction {
			transaction_type: TransactionType::MultisigAccountModification,
			signer_address: m.clone(),
			recipient_address: None,
			address_additions: vec![test_address('N').into()],
			address_deletions: vec![],
		}],
		..aggregate(Some('A'), &[], vec![])
	};
	assert!(!verifier.is_complete(&addition).await.unwrap());
}

#[tokio::test]
async fn test_every_inner_transaction_must_be_satisfied() {
	let multisig = StaticMultisigRepository::new()
		.with_info(ordinary('S'))
		.with_info(ordinary('T'));
	let verifier = AggregateVerifier::new(multisig, network_repo());

	// S is in the signer set, T is not: the aggregate as a whole is
	// incomplete
	let tx = aggregate(
		Some('S'),
		&[],
		vec![inner_signed_by('S'), inner_signed_by('T')],
	);
	assert!(!verifier.is_complete(&tx).await.unwrap());
}

#[tokio::test]
async fn test_non_aggregate_is_rejected() {
	let verifier = AggregateVerifier::new(StaticMultisigRepository::new(), network_repo());
	let transfer = Transaction {
		transaction_type: TransactionType::Transfer,
		..aggregate(Some('S'), &[], vec![])
	};

	let err = verifier.is_complete(&transfer).await.unwrap_err();
	assert!(matches!(err, VerifierError::NotAggregate(_)));
}

#[tokio::test]
async fn test_lookup_failures_surface_to_the_caller() {
	// No record for the inner signer at all
	let verifier = AggregateVerifier::new(StaticMultisigRepository::new(), network_repo());
	let tx = aggregate(Some('S'), &[], vec![inner_signed_by('S')]);

	let err = verifier.is_complete(&tx).await.unwrap_err();
	assert!(matches!(
		err,
		VerifierError::Repository(RepositoryError::NotFound { .. })
	));
}

#[tokio::test]
async fn test_max_cosignatures_counts_distinct_addresses() {
	let m2 = test_address('2');
	let m1 = test_address('3');
	let a = test_address('A');
	let b = test_address('B');
	// A cosigns at both levels and must be counted once
	let multisig = StaticMultisigRepository::new().with_graph(
		&m2,
		graph_of(vec![
			(0, vec![multisig_info(&m2, 1, 1, &[&m1, &a], &[])]),
			(1, vec![multisig_info(&m1, 1, 1, &[&a, &b], &[])]),
		]),
	);
	let verifier = AggregateVerifier::new(multisig, network_repo());

	assert_eq!(verifier.max_cosignatures(&m2).await.unwrap(), 3);
}

#[tokio::test]
async fn test_network_max_cosignatures_reads_the_property() {
	let mut repo = MockNetworkRepo::new();
	repo.expect_network_properties().returning(|| {
		Ok(serde_json::from_value(serde_json::json!({
			"plugins": { "aggregate": { "maxCosignaturesPerAggregate": "25" } }
		}))
		.unwrap())
	});
	let verifier = AggregateVerifier::new(StaticMultisigRepository::new(), repo);

	assert_eq!(
		verifier.network_max_cosignatures_per_aggregate().await.unwrap(),
		25
	);
}

#[tokio::test]
async fn test_missing_network_property_fails_loudly() {
	let verifier = AggregateVerifier::new(StaticMultisigRepository::new(), network_repo());

	let err = verifier
		.network_max_cosignatures_per_aggregate()
		.await
		.unwrap_err();
	assert!(matches!(err, VerifierError::MissingNetworkProperty(_)));
}
