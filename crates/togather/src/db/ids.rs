use crate::Result;
use sea_orm::{
    sea_query::{self, Value, ValueTypeErr},
    DbErr,
};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            #[allow(unused)]
            pub const MAX: Self = Self(i32::MAX);
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<$name> for sea_query::Value {
            fn from(value: $name) -> Self {
                sea_query::Value::Int(Some(value.0))
            }
        }

        impl sea_orm::TryGetable for $name {
            fn try_get_by<I: sea_orm::ColIdx>(
                res: &sea_orm::QueryResult,
                index: I,
            ) -> Result<Self, sea_orm::TryGetError> {
                Ok(Self(i32::try_get_by(res, index)?))
            }
        }

        impl sea_query::ValueType for $name {
            fn try_from(v: Value) -> Result<Self, sea_query::ValueTypeErr> {
                Ok(Self(value_to_integer(v)?))
            }

            fn type_name() -> String {
                stringify!($name).into()
            }

            fn array_type() -> sea_query::ArrayType {
                sea_query::ArrayType::Int
            }

            fn column_type() -> sea_query::ColumnType {
                sea_query::ColumnType::Integer
            }
        }

        impl sea_orm::TryFromU64 for $name {
            fn try_from_u64(n: u64) -> Result<Self, DbErr> {
                Ok(Self(n.try_into().map_err(|_| {
                    DbErr::ConvertFromU64(concat!(
                        "error converting ",
                        stringify!($name),
                        " to u64"
                    ))
                })?))
            }
        }

        impl sea_query::Nullable for $name {
            fn null() -> Value {
                Value::Int(None)
            }
        }
    };
}

fn value_to_integer(v: Value) -> Result<i32, ValueTypeErr> {
    match v {
        Value::TinyInt(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::SmallInt(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::Int(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::BigInt(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::TinyUnsigned(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::SmallUnsigned(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::Unsigned(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        Value::BigUnsigned(Some(int)) => int.try_into().map_err(|_| ValueTypeErr),
        _ => Err(ValueTypeErr),
    }
}

id_type!(ChatMessageId);
id_type!(ChatRoomId);
id_type!(CommentId);
id_type!(MemberId);
id_type!(MemberTechStackId);
id_type!(ProjectId);
id_type!(ProjectMemberId);
id_type!(ProjectTechStackId);
id_type!(TechStackId);
