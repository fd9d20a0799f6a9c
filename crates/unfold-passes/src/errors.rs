//! Error types for the unfolding passes.

use derive_more::{Display, From};
use unfold_ir::Identifier;

pub type UnfoldResult<T> = Result<T, UnfoldError>;

#[derive(Clone, Display, Debug, From, PartialEq)]
#[display("{kind}")]
pub struct UnfoldError {
    #[from]
    kind: Box<UnfoldErrorKind>,
}

impl<E> From<E> for UnfoldError
where
    UnfoldErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        UnfoldError {
            kind: Box::new(UnfoldErrorKind::from(error)),
        }
    }
}

impl UnfoldError {
    pub fn kind(&self) -> &UnfoldErrorKind {
        &self.kind
    }

    pub(crate) fn missing_entry(name: &str) -> Self {
        UnfoldErrorKind::MissingEntry(name.to_owned()).into()
    }

    pub(crate) fn entry_not_function(name: &str) -> Self {
        UnfoldErrorKind::EntryNotFunction(name.to_owned()).into()
    }

    pub(crate) fn unsupported_tuple_field(
        function: &str,
        var: &str,
        index: usize,
        field_kind: &'static str,
    ) -> Self {
        UnfoldErrorKind::UnsupportedTupleField {
            function: function.to_owned(),
            var: var.to_owned(),
            index,
            field_kind,
        }
        .into()
    }

    pub(crate) fn flat_param_clash(function: &str, param: &str, name: &str) -> Self {
        UnfoldErrorKind::FlatParamClash {
            function: function.to_owned(),
            param: param.to_owned(),
            name: name.to_owned(),
        }
        .into()
    }

    pub(crate) fn illegal_arity_growth(
        function: &str,
        callee: &str,
        original: usize,
        expanded: usize,
    ) -> Self {
        UnfoldErrorKind::IllegalArityGrowth {
            function: function.to_owned(),
            callee: callee.to_owned(),
            original,
            expanded,
        }
        .into()
    }

    pub(crate) fn projection_out_of_range(
        function: &str,
        var: &str,
        index: usize,
        arity: usize,
    ) -> Self {
        UnfoldErrorKind::ProjectionOutOfRange {
            function: function.to_owned(),
            var: var.to_owned(),
            index,
            arity,
        }
        .into()
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum UnfoldErrorKind {
    #[display("Entry function @{_0} is not in the module")]
    MissingEntry(Identifier),

    #[display("Entry @{_0} is a primitive function, not a function with a body")]
    EntryNotFunction(Identifier),

    #[display(
        "Unsupported tuple field in @{function}: field {index} of %{var} is a {field_kind}, expected a constant or a variable"
    )]
    UnsupportedTupleField {
        function: Identifier,
        var: Identifier,
        index: usize,
        field_kind: &'static str,
    },

    #[display(
        "Can not flatten %{param} in @{function}: flat parameter %{name} is already taken"
    )]
    FlatParamClash {
        function: Identifier,
        param: Identifier,
        name: Identifier,
    },

    #[display(
        "Can not unfold tuples passed to fixed-arity @{callee} in @{function}: {original} args expand to {expanded} args"
    )]
    IllegalArityGrowth {
        function: Identifier,
        callee: Identifier,
        original: usize,
        expanded: usize,
    },

    #[display(
        "Projection out of range in @{function}: %{var} has {arity} fields, index {index} requested"
    )]
    ProjectionOutOfRange {
        function: Identifier,
        var: Identifier,
        index: usize,
        arity: usize,
    },
}

impl std::error::Error for UnfoldError {}
