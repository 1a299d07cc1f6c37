//! kvkit Derive — procedural macros for the kvkit toolkit.
//!
//! Provides `#[derive(Model)]`, which implements `kvkit::ModelSchema` for a
//! struct with named fields: one `id: Option<i64>` field (the primary key;
//! a derive macro cannot inject a field into the struct it decorates, so
//! callers declare it themselves — see DESIGN.md), plus any number of
//! typed, optionally-indexed data fields.

use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Meta, Token, Type};

/// Derive macro for declaring a kvkit model.
///
/// ```ignore
/// #[derive(Model)]
/// #[model(serialize = false)]
/// struct Person {
///     id: Option<i64>,
///     #[field(indexed)]
///     first: String,
///     #[field(indexed)]
///     last: String,
///     #[field(indexed, kind = "date")]
///     dob: String,
/// }
/// ```
///
/// Generates a memoized `&'static [FieldSpec]` schema and a `ModelSchema`
/// impl whose `get_field`/`set_field` dispatch by field name.
#[proc_macro_derive(Model, attributes(model, field))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let model_name = name.to_string().to_lowercase();
    let serialize = struct_serialize_flag(&input);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Model can only be derived for structs with named fields"),
        },
        _ => panic!("Model can only be derived for structs"),
    };

    let id_field = fields
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == "id").unwrap_or(false));
    if id_field.is_none() {
        panic!("Model structs must declare `id: Option<i64>` (derive macros cannot inject a field)");
    }

    let data_fields: Vec<_> = fields
        .iter()
        .filter(|f| f.ident.as_ref().map(|i| i != "id").unwrap_or(true))
        .collect();

    let mut field_specs = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut default_inits = Vec::new();

    for (order, f) in data_fields.iter().enumerate() {
        let ident = f.ident.as_ref().expect("named field");
        let field_name = ident.to_string();
        let kind = field_kind(f);
        let indexed = field_indexed(f);
        let kind_ident = kind.as_ident();

        field_specs.push(quote! {
            kvkit::model::FieldSpec {
                name: #field_name,
                kind: kvkit::codec::FieldKind::#kind_ident,
                indexed: #indexed,
                default: kvkit::model::FieldDefault::None,
                order: #order,
            }
        });

        get_arms.push(kind.get_arm(&field_name, ident));
        set_arms.push(kind.set_arm(&field_name, ident));
        default_inits.push(kind.default_init(ident));
    }

    let field_count = field_specs.len();

    let expanded = quote! {
        impl #name {
            fn __kvkit_schema() -> &'static [kvkit::model::FieldSpec] {
                static SCHEMA: std::sync::OnceLock<[kvkit::model::FieldSpec; #field_count]> =
                    std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| [#(#field_specs),*])
            }
        }

        impl kvkit::ModelSchema for #name {
            const MODEL_NAME: &'static str = #model_name;
            const SERIALIZE: bool = #serialize;

            fn schema_fields() -> &'static [kvkit::model::FieldSpec] {
                Self::__kvkit_schema()
            }

            fn with_defaults() -> Self {
                Self {
                    id: None,
                    #(#default_inits),*
                }
            }

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            fn get_field(&self, name: &str) -> kvkit::KvResult<kvkit::codec::Value> {
                match name {
                    "id" => Ok(match self.id {
                        Some(v) => kvkit::codec::Value::Long(v),
                        None => kvkit::codec::Value::Null,
                    }),
                    #(#get_arms),*,
                    other => Err(kvkit::KvError::Type(format!(
                        "no such field {other:?} on model {:?}", #model_name
                    ))),
                }
            }

            fn set_field(&mut self, name: &str, value: kvkit::codec::Value) -> kvkit::KvResult<()> {
                match name {
                    "id" => {
                        if let kvkit::codec::Value::Long(v) = value {
                            self.id = Some(v);
                        }
                        Ok(())
                    }
                    #(#set_arms),*,
                    other => Err(kvkit::KvError::Type(format!(
                        "no such field {other:?} on model {:?}", #model_name
                    ))),
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Parse `#[attr_name(item, item = value, ...)]` into its comma-separated
/// list of metas, across every attribute on `attrs` named `attr_name`.
fn nested_metas(attrs: &[syn::Attribute], attr_name: &str) -> Vec<Meta> {
    let mut out = Vec::new();
    for attr in attrs {
        if attr.path().is_ident(attr_name)
            && let Ok(list) = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        {
            out.extend(list);
        }
    }
    out
}

fn struct_serialize_flag(input: &DeriveInput) -> bool {
    for meta in nested_metas(&input.attrs, "model") {
        if let Meta::NameValue(nv) = meta
            && nv.path.is_ident("serialize")
            && let syn::Expr::Lit(lit) = nv.value
            && let syn::Lit::Bool(b) = lit.lit
        {
            return b.value();
        }
    }
    true
}

fn field_indexed(field: &syn::Field) -> bool {
    nested_metas(&field.attrs, "field")
        .iter()
        .any(|meta| matches!(meta, Meta::Path(p) if p.is_ident("indexed")))
}

fn field_explicit_kind(field: &syn::Field) -> Option<String> {
    for meta in nested_metas(&field.attrs, "field") {
        if let Meta::NameValue(nv) = meta
            && nv.path.is_ident("kind")
            && let syn::Expr::Lit(lit) = nv.value
            && let syn::Lit::Str(s) = lit.lit
        {
            return Some(s.value());
        }
    }
    None
}

/// The subset of `FieldKind` variants a derive macro can infer or accept
/// by attribute, plus the code generation each needs (Rust type <->
/// `Value` conversions differ per kind).
enum Kind {
    String,
    Long,
    Float,
    Date,
    DateTime,
}

impl Kind {
    fn as_ident(&self) -> proc_macro2::Ident {
        let name = match self {
            Kind::String => "String",
            Kind::Long => "Long",
            Kind::Float => "Float",
            Kind::Date => "Date",
            Kind::DateTime => "DateTime",
        };
        proc_macro2::Ident::new(name, proc_macro2::Span::call_site())
    }

    fn get_arm(&self, field_name: &str, ident: &syn::Ident) -> proc_macro2::TokenStream {
        match self {
            Kind::String => quote! {
                #field_name => Ok(kvkit::codec::Value::Bytes(self.#ident.clone().into_bytes()))
            },
            Kind::Date => quote! {
                #field_name => Ok(kvkit::codec::Value::Date(self.#ident.clone()))
            },
            Kind::DateTime => quote! {
                #field_name => Ok(kvkit::codec::Value::DateTime(self.#ident.clone()))
            },
            Kind::Long => quote! {
                #field_name => Ok(kvkit::codec::Value::Long(self.#ident))
            },
            Kind::Float => quote! {
                #field_name => Ok(kvkit::codec::Value::Float(self.#ident))
            },
        }
    }

    fn set_arm(&self, field_name: &str, ident: &syn::Ident) -> proc_macro2::TokenStream {
        match self {
            Kind::String => quote! {
                #field_name => {
                    if let kvkit::codec::Value::Bytes(b) = value {
                        self.#ident = String::from_utf8(b).map_err(|e| kvkit::KvError::Type(e.to_string()))?;
                    }
                    Ok(())
                }
            },
            Kind::Date => quote! {
                #field_name => {
                    if let kvkit::codec::Value::Date(s) = value {
                        self.#ident = s;
                    }
                    Ok(())
                }
            },
            Kind::DateTime => quote! {
                #field_name => {
                    if let kvkit::codec::Value::DateTime(s) = value {
                        self.#ident = s;
                    }
                    Ok(())
                }
            },
            Kind::Long => quote! {
                #field_name => {
                    if let kvkit::codec::Value::Long(v) = value {
                        self.#ident = v;
                    }
                    Ok(())
                }
            },
            Kind::Float => quote! {
                #field_name => {
                    if let kvkit::codec::Value::Float(v) = value {
                        self.#ident = v;
                    }
                    Ok(())
                }
            },
        }
    }

    fn default_init(&self, ident: &syn::Ident) -> proc_macro2::TokenStream {
        match self {
            Kind::String | Kind::Date | Kind::DateTime => quote! { #ident: String::new() },
            Kind::Long => quote! { #ident: 0 },
            Kind::Float => quote! { #ident: 0.0 },
        }
    }
}

fn field_kind(field: &syn::Field) -> Kind {
    if let Some(explicit) = field_explicit_kind(field) {
        return match explicit.as_str() {
            "string" => Kind::String,
            "long" => Kind::Long,
            "float" => Kind::Float,
            "date" => Kind::Date,
            "datetime" => Kind::DateTime,
            other => panic!("unknown field kind {other:?}"),
        };
    }
    match &field.ty {
        Type::Path(p) if p.path.is_ident("String") => Kind::String,
        Type::Path(p) if p.path.is_ident("i64") => Kind::Long,
        Type::Path(p) if p.path.is_ident("f64") => Kind::Float,
        other => panic!(
            "cannot infer a field kind for type {:?}; annotate with #[field(kind = \"...\")]",
            quote!(#other).to_string()
        ),
    }
}
