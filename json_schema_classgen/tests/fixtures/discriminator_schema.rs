//! Generated by json-schema-classgen. Do not edit manually.

pub mod discriminator_schema {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Apple {
        #[serde(rename = "Foo")]
        pub foo: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Orange {
        #[serde(rename = "Bar")]
        pub bar: Option<String>,
    }

    /// A fruit, discriminated by its type name.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "discriminator")]
    pub enum Fruit {
        #[serde(rename = "Apple")]
        Apple(Apple),
        #[serde(rename = "Orange")]
        Orange(Orange),
    }

    impl From<Apple> for Fruit {
        fn from(value: Apple) -> Self {
            Self::Apple(value)
        }
    }

    impl From<Orange> for Fruit {
        fn from(value: Orange) -> Self {
            Self::Orange(value)
        }
    }

    impl json_schema_classgen::Polymorphic for Fruit {
        const DISCRIMINATOR: &'static str = "discriminator";
        const VARIANTS: &'static [&'static str] = &["Apple", "Orange"];

        fn variant_tag(&self) -> &'static str {
            match self {
                Self::Apple(_) => "Apple",
                Self::Orange(_) => "Orange",
            }
        }
    }
}
