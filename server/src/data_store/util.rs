/// Implement diesel's `ToSql<Text, _>` and `FromSql<Text, _>` for a fieldless enum that is stored
/// as a lowercase string identifier in the database.
///
/// The enum must implement `as_db_str(&self) -> &'static str` and
/// `from_db_str(&str) -> Option<Self>`, and derive `AsExpression` and `FromSqlRow` with
/// `#[diesel(sql_type = diesel::sql_types::Text)]`.
macro_rules! text_enum_sql_conversion {
    ($enum_type:ty) => {
        impl<DB> diesel::serialize::ToSql<diesel::sql_types::Text, DB> for $enum_type
        where
            DB: diesel::backend::Backend,
            str: diesel::serialize::ToSql<diesel::sql_types::Text, DB>,
            for<'c> DB: diesel::backend::Backend<
                BindCollector<'c> = diesel::query_builder::bind_collector::RawBytesBindCollector<DB>,
            >,
        {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, DB>,
            ) -> diesel::serialize::Result {
                <str as diesel::serialize::ToSql<diesel::sql_types::Text, DB>>::to_sql(
                    self.as_db_str(),
                    &mut out.reborrow(),
                )
            }
        }

        impl<DB> diesel::deserialize::FromSql<diesel::sql_types::Text, DB> for $enum_type
        where
            DB: diesel::backend::Backend,
            String: diesel::deserialize::FromSql<diesel::sql_types::Text, DB>,
        {
            fn from_sql(
                bytes: <DB as diesel::backend::Backend>::RawValue<'_>,
            ) -> diesel::deserialize::Result<Self> {
                let value = String::from_sql(bytes)?;
                Self::from_db_str(&value).ok_or_else(|| {
                    format!(
                        "'{}' is not a valid value for {}",
                        value,
                        stringify!($enum_type)
                    )
                    .into()
                })
            }
        }
    };
}

pub(crate) use text_enum_sql_conversion;
