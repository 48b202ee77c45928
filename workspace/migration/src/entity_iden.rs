use model::entities::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::Iden;

/// Derives migration identifiers from the entity definitions so table and
/// column names are written down once, in the `model` crate.
pub trait EntityIden: EntityTrait {
    /// Identifier of the entity's table.
    fn table() -> Ident {
        Ident(Self::default().table_name().to_string())
    }

    /// Identifier of one of the entity's columns.
    fn column<C: ColumnTrait + Iden>(column: C) -> Ident {
        let mut s = String::new();
        column.unquoted(&mut s);
        Ident(s)
    }

    /// Conventional foreign key name: `fk_<table>_<column>`.
    fn foreign_key_name<C: ColumnTrait + Iden>(column: C) -> String {
        format!("fk_{}_{}", Self::table().0, Self::column(column).0)
    }
}

impl EntityIden for User {}
impl EntityIden for Session {}

/// An owned table or column name.
#[derive(Debug, Clone)]
pub struct Ident(String);

impl Iden for Ident {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}
