//! Well-known label names shared by the model and the rule editor core.

/// Label that scopes an alert rule to a single network.
///
/// The surrounding multi-tenant system injects `networkID="<id>"` into every
/// selector of a rule before it reaches the rule store. It is never shown in
/// the threshold editor and never user-editable, so it is stripped whenever a
/// selector is turned into a [`crate::ThresholdExpression`].
pub const LABEL_NETWORK_ID: &str = "networkID";
