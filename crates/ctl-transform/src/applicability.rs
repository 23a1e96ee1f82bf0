// SPDX-License-Identifier: MIT OR Apache-2.0
//! Which validations each behaviour can affect.
//!
//! Every known [`Behavior`] has an entry; the `match` below is exhaustive,
//! so adding a behaviour to the vocabulary without deciding its scope does
//! not compile. Behaviour names outside the vocabulary are treated as
//! relevant everywhere.

use ctl_core::{Behavior, BehaviorId, Function, FunctionId};
use tracing::warn;

const LINE_HANDLING: &[Function] = &[
    Function::Parse,
    Function::ParseIndented,
    Function::CanonicalFormat,
    Function::Load,
];

const TAB_HANDLING: &[Function] = &[
    Function::Parse,
    Function::ParseIndented,
    Function::CanonicalFormat,
    Function::Load,
    Function::BuildHierarchy,
];

/// The validations `behavior` can change the result of.
pub fn affected_functions(behavior: Behavior) -> &'static [Function] {
    match behavior {
        Behavior::BooleanStrict | Behavior::BooleanLenient => &[Function::GetBool],
        Behavior::ListCoercionEnabled | Behavior::ListCoercionDisabled => &[Function::GetList],
        Behavior::CrlfNormalizeToLf | Behavior::CrlfPreserveLiteral => LINE_HANDLING,
        Behavior::TabsPreserve | Behavior::TabsToSpaces => TAB_HANDLING,
        Behavior::StrictSpacing | Behavior::LooseSpacing => {
            &[Function::Parse, Function::ParseIndented]
        }
        Behavior::ArrayOrderInsertion | Behavior::ArrayOrderLexicographic => {
            &[Function::BuildHierarchy, Function::GetList]
        }
    }
}

/// Whether `behavior` is relevant to a test of `validation`.
///
/// Unknown behaviours fail open: they are kept, with a warning.
pub fn applies_to(behavior: &BehaviorId, validation: &FunctionId) -> bool {
    let Some(known) = behavior.known() else {
        warn!(
            target: "ctl.transform",
            %behavior,
            %validation,
            "behavior has no applicability entry; keeping it"
        );
        return true;
    };
    validation
        .known()
        .is_some_and(|f| affected_functions(known).contains(&f))
}

/// `behaviors` restricted to those relevant to `validation`, order kept.
pub fn filter_behaviors(behaviors: &[BehaviorId], validation: &FunctionId) -> Vec<BehaviorId> {
    behaviors
        .iter()
        .filter(|b| applies_to(b, validation))
        .cloned()
        .collect()
}
