#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// String-keyed attribute bags for nodes, edges, and component sets.
pub mod attr;
/// Component sets and the covering table.
pub mod comp;
/// The decontractible-graph data model.
pub mod dec;
/// Error taxonomy.
pub mod error;
/// Plain directed graphs and the algorithms the schemes run on.
pub mod graph;
/// The hierarchy façade.
pub mod multilevel;
/// The contraction-scheme engine and the concrete schemes.
pub mod scheme;
/// Buffered event quadruples flowing between levels.
pub mod update;

#[allow(missing_docs)]
pub mod prelude {
    pub use crate::{
        attr::{AttrValue, Attrs},
        comp::{CompId, CompTable, ComponentSet},
        dec::{DecGraph, EdgeKey, InteriorGraph, NodeKey, Superedge, Supernode},
        error::*,
        graph::{DiGraph, Direction, GraphKey},
        multilevel::{LevelSignature, MultilevelGraph},
        scheme::{
            AttrFns, CircuitsRule, CliquesRule, ContractionRule, ContractionScheme,
            Decontraction, EdgeBasedRule, SccsRule, SchemeCx, StarsRule,
        },
        update::UpdateQuadruple,
    };
}
