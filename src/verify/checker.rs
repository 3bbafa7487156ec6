//! Intent-behavior consistency checking.
//!
//! Compares the behavioral fingerprint (what the code actually does)
//! against the declared intent, effects, preconditions, and postconditions.
//! Findings are collected, never thrown: every rule contributes zero or
//! more results, and one rule's finding never suppresses another's
//! evaluation. The single exception is a missing body (E004), which makes
//! the remaining body-dependent rules meaningless.
//!
//! Codes:
//!   E001 — undeclared mutation (effect completeness)
//!   E002 — touches_nothing_else violated by mutation
//!   E003 — touches_nothing_else violated by external call
//!   E004 — missing body
//!   E005 — undeclared event emission
//!   W001 — declared effect not observed in body (effect soundness)
//!   W002 — declared emits not observed in body (emit soundness)
//!   W003 — missing precondition
//!   W004 — missing postcondition
//!   W005 — missing effects declaration
//!   W006 — precondition references state not used in body
//!   W007 — postcondition uses old() for state not modified
//!   W008 — capability used beyond declared requires scope
//!   I001 — contract has recursion
//!   I002 — contract has high nesting depth

use std::collections::BTreeSet;
use std::fmt;

use crate::ast::{ContractDef, EffectDecl, Effects, Program, RiskLevel};
use crate::verify::fingerprint::{
    fingerprint_contract, fingerprint_expressions, BehavioralFingerprint,
};

/// Severity of a verification finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, no action required.
    Info,
    /// Potential issue, review recommended.
    Warning,
    /// Definite inconsistency, must fix.
    Error,
    /// Security-relevant inconsistency.
    Critical,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single finding from the intent verification engine.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub severity: Severity,
    /// Machine-readable code, e.g. `E001`.
    pub code: &'static str,
    pub message: String,
    pub contract_name: String,
    pub file: String,
    pub line: u32,
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = if self.file.is_empty() {
            String::new()
        } else {
            format!("{}:{}", self.file, self.line)
        };
        write!(
            f,
            "[{}] {}: {}: contract '{}': {}",
            self.severity, self.code, loc, self.contract_name, self.message
        )
    }
}

/// Run all consistency checks on a single contract.
///
/// `fingerprint` may be pre-computed; pass `None` to compute it here.
/// `declared_capabilities` comes from the file header's `requires`;
/// `risk_level` elevates the missing-section warnings to errors at
/// HIGH or CRITICAL.
pub fn verify_contract(
    contract: &ContractDef,
    fingerprint: Option<&BehavioralFingerprint>,
    file: &str,
    declared_capabilities: Option<&[String]>,
    risk_level: RiskLevel,
) -> Vec<VerificationResult> {
    let computed;
    let fp = match fingerprint {
        Some(fp) => fp,
        None => {
            computed = fingerprint_contract(contract);
            &computed
        }
    };

    let mut results = Vec::new();
    let line = contract.loc.line;
    let name = contract.name.as_str();

    let add = |results: &mut Vec<VerificationResult>,
                   severity: Severity,
                   code: &'static str,
                   message: String| {
        results.push(VerificationResult {
            severity,
            code,
            message,
            contract_name: name.to_string(),
            file: file.to_string(),
            line,
        });
    };

    // -- Structural completeness ----------------------------------------

    if contract.body.is_none() {
        add(&mut results, Severity::Error, "E004", "contract has no body".to_string());
        return results; // nothing left to check without a body
    }

    let missing_section_severity = if risk_level.is_elevated() {
        Severity::Error
    } else {
        Severity::Warning
    };

    if contract.precondition.is_none() {
        add(
            &mut results,
            missing_section_severity,
            "W003",
            "no precondition — every contract should declare what must be true before execution"
                .to_string(),
        );
    }

    if contract.postcondition.is_none() {
        add(
            &mut results,
            missing_section_severity,
            "W004",
            "no postcondition — every contract should declare what will be true after execution"
                .to_string(),
        );
    }

    if contract.effects.is_none() {
        add(
            &mut results,
            missing_section_severity,
            "W005",
            "no effects declaration — every contract must declare its side effects".to_string(),
        );
    }

    // -- Effect completeness (E001 / E002) ------------------------------
    // Every mutation in the body must be covered by a declared modifies.

    let declared_modifies = declared_modifies(contract.effects.as_ref());
    let declared_reads = declared_reads(contract.effects.as_ref());
    let declared_emits = declared_emits(contract.effects.as_ref());
    let touches_nothing = has_touches_nothing_else(contract.effects.as_ref());

    for mutation in &fp.mutations {
        if !is_covered_by(mutation, &declared_modifies) {
            if touches_nothing {
                add(
                    &mut results,
                    Severity::Error,
                    "E002",
                    format!(
                        "touches_nothing_else violated: body mutates '{}' \
                         which is not in the modifies declaration",
                        mutation
                    ),
                );
            } else {
                add(
                    &mut results,
                    Severity::Warning,
                    "E001",
                    format!(
                        "body mutates '{}' but it is not listed in \
                         the effects modifies declaration",
                        mutation
                    ),
                );
            }
        }
    }

    // -- Effect soundness (W001) ----------------------------------------
    // Every declared modifies target should actually be mutated.

    for declared in &declared_modifies {
        if !is_observed_in(declared, &fp.mutations) {
            add(
                &mut results,
                Severity::Warning,
                "W001",
                format!(
                    "effects declares modifies '{}' but the body does not appear to mutate it",
                    declared
                ),
            );
        }
    }

    // -- Emit completeness (E005) ---------------------------------------

    for event in &fp.emitted_events {
        if !declared_emits.contains(event) {
            let severity = if touches_nothing {
                Severity::Error
            } else {
                Severity::Warning
            };
            add(
                &mut results,
                severity,
                "E005",
                format!("body emits '{}' but it is not declared in the effects block", event),
            );
        }
    }

    // -- Emit soundness (W002) ------------------------------------------

    for declared_event in &declared_emits {
        if !fp.emitted_events.contains(declared_event) {
            add(
                &mut results,
                Severity::Warning,
                "W002",
                format!(
                    "effects declares emits '{}' but the body does not emit it",
                    declared_event
                ),
            );
        }
    }

    // -- touches_nothing_else call whitelist (E003) ----------------------

    if touches_nothing {
        let mut allowed_roots: BTreeSet<&str> = BTreeSet::new();
        for m in &declared_modifies {
            allowed_roots.insert(root_of(m));
        }
        for r in &declared_reads {
            allowed_roots.insert(root_of(r));
        }
        for param in &contract.params {
            allowed_roots.insert(param.name.as_str());
        }
        if let Some(caps) = declared_capabilities {
            for cap in caps {
                allowed_roots.insert(root_of(cap));
            }
        }

        for call in &fp.calls {
            let root = root_of(call);
            if allowed_roots.contains(root) {
                continue;
            }
            // Capitalized roots are constructor/type calls
            if root.chars().next().is_some_and(|c| c.is_uppercase()) {
                continue;
            }
            // Calls through locally assigned names are fine
            if fp.mutations.contains(root) {
                continue;
            }
            add(
                &mut results,
                Severity::Error,
                "E003",
                format!(
                    "touches_nothing_else violated: body calls '{}' \
                     which is not covered by declared effects or parameters",
                    call
                ),
            );
        }
    }

    // -- Precondition relevance (W006) -----------------------------------
    // Preconditions should reference parameters or state the body uses.

    if let Some(precondition) = &contract.precondition {
        let precond_fp = fingerprint_expressions(&precondition.conditions);

        let mut body_roots: BTreeSet<&str> = BTreeSet::new();
        for r in &fp.reads {
            body_roots.insert(root_of(r));
        }
        for m in &fp.mutations {
            body_roots.insert(root_of(m));
        }

        for read in &precond_fp.reads {
            let root = root_of(read);
            // Capitalized names are type/constructor references
            if root.chars().next().is_some_and(|c| c.is_uppercase()) {
                continue;
            }
            let is_param = contract.params.iter().any(|p| p.name == root);
            if !is_param && !body_roots.contains(root) {
                add(
                    &mut results,
                    Severity::Warning,
                    "W006",
                    format!(
                        "precondition references '{}' which is not a parameter \
                         and not used in the body",
                        read
                    ),
                );
            }
        }
    }

    // -- Postcondition achievability (W007) -------------------------------
    // old() references should name state the body actually modifies.

    if let Some(postcondition) = &contract.postcondition {
        let postcond_fp = fingerprint_expressions(&postcondition.conditions);
        for old_ref in &postcond_fp.old_references {
            if !is_mutation_covered(old_ref, &fp.mutations) {
                add(
                    &mut results,
                    Severity::Warning,
                    "W007",
                    format!(
                        "postcondition uses old({}) but the body does not appear to modify '{}'",
                        old_ref, old_ref
                    ),
                );
            }
        }
    }

    // -- Capability scope (W008) ------------------------------------------

    if let Some(caps) = declared_capabilities {
        if !caps.is_empty() {
            let cap_roots: BTreeSet<&str> = caps.iter().map(|c| root_of(c)).collect();

            for check in &fp.capability_checks {
                // "subject has capability" — the capability part is checked
                if let Some((_, cap_path)) = check.split_once(" has ") {
                    let cap_root = root_of(cap_path);
                    let is_param = contract.params.iter().any(|p| p.name == cap_root);
                    if !cap_roots.contains(cap_root) && !is_param {
                        add(
                            &mut results,
                            Severity::Warning,
                            "W008",
                            format!(
                                "body checks capability '{}' but the file header \
                                 only requires: [{}]",
                                cap_path,
                                caps.join(", ")
                            ),
                        );
                    }
                }
            }
        }
    }

    // -- Informational ----------------------------------------------------

    if fp.has_recursion {
        add(
            &mut results,
            Severity::Info,
            "I001",
            "contract contains recursive self-calls".to_string(),
        );
    }

    if fp.max_nesting_depth >= 4 {
        add(
            &mut results,
            Severity::Info,
            "I002",
            format!(
                "contract has nesting depth {} — consider simplifying for auditability",
                fp.max_nesting_depth
            ),
        );
    }

    results
}

/// Run verification on every contract of a program, using the file
/// header's risk level and required capabilities.
pub fn verify_program(program: &Program, file: &str) -> Vec<VerificationResult> {
    let mut risk_level = RiskLevel::Low;
    let mut declared_capabilities: Option<&[String]> = None;

    if let Some(header) = &program.header {
        if let Some(risk) = &header.risk {
            risk_level = risk.level;
        }
        if let Some(requires) = &header.requires {
            declared_capabilities = Some(&requires.capabilities);
        }
    }

    let mut results = Vec::new();
    for contract in &program.contracts {
        let fp = fingerprint_contract(contract);
        results.extend(verify_contract(
            contract,
            Some(&fp),
            file,
            declared_capabilities,
            risk_level,
        ));
    }
    results
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn declared_modifies(effects: Option<&Effects>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Some(effects) = effects {
        for decl in &effects.declarations {
            if let EffectDecl::Modifies { targets, .. } = decl {
                out.extend(targets.iter().cloned());
            }
        }
    }
    out
}

fn declared_reads(effects: Option<&Effects>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Some(effects) = effects {
        for decl in &effects.declarations {
            if let EffectDecl::Reads { targets, .. } = decl {
                out.extend(targets.iter().cloned());
            }
        }
    }
    out
}

fn declared_emits(effects: Option<&Effects>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Some(effects) = effects {
        for decl in &effects.declarations {
            if let EffectDecl::Emits { event, .. } = decl {
                out.insert(event.clone());
            }
        }
    }
    out
}

fn has_touches_nothing_else(effects: Option<&Effects>) -> bool {
    effects.is_some_and(|e| {
        e.declarations
            .iter()
            .any(|d| matches!(d, EffectDecl::TouchesNothingElse { .. }))
    })
}

/// First dotted component of a path.
fn root_of(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Is an actual mutation path covered by the declared paths?
///
/// `from.balance` is covered by `from.balance` (exact) or by `from`
/// (a parent covers its children). Dotless names are local temporaries
/// and always count as covered.
fn is_covered_by(actual: &str, declared: &BTreeSet<String>) -> bool {
    if declared.contains(actual) {
        return true;
    }
    if declared
        .iter()
        .any(|d| actual.starts_with(&format!("{}.", d)))
    {
        return true;
    }
    !actual.contains('.')
}

/// Is an `old()` reference covered by the actual mutations?
///
/// Unlike [`is_covered_by`], dotless names are NOT auto-allowed: an old()
/// reference asserts that state was modified, so every referenced path
/// must match a mutation in one direction or the other.
fn is_mutation_covered(reference: &str, mutations: &BTreeSet<String>) -> bool {
    if mutations.contains(reference) {
        return true;
    }
    mutations.iter().any(|m| {
        reference.starts_with(&format!("{}.", m)) || m.starts_with(&format!("{}.", reference))
    })
}

/// Is a declared effect path observed in the actual mutations? Handles
/// imprecision in both directions: an actual mutation may extend the
/// declaration, or the declaration may extend an actual mutation.
fn is_observed_in(declared: &str, actual: &BTreeSet<String>) -> bool {
    if actual.contains(declared) {
        return true;
    }
    actual.iter().any(|a| {
        a.starts_with(&format!("{}.", declared)) || declared.starts_with(&format!("{}.", a))
    })
}
