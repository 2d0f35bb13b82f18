use nix::unistd::Pid;
use syscalls::Sysno;
use tracing::debug;

use crate::{
    auxiliary::constants::general::{UNIX_ABSTRACT_TAG, UNIX_PATH_TAG},
    parser::{Literal, StructEntry},
    resource_tracker::ResourceTracker,
    types::{
        BranchSelector, FieldType, ResourceKind, StructType, SyscallCatalog, SyscallVariant,
        UnionBranch, UnionType,
    },
    utilities::{flag_terms_known, literal_value, truncate_to_width},
};

#[derive(Clone, Copy, Debug)]
pub struct VariantChoice<'c> {
    pub variant: &'c SyscallVariant,
    pub score: u32,
    // nothing admitted the literals, `variant` is the generic descriptor
    pub fallback: bool,
}

/// Picks the variant of `sysno` whose declared fields fit `args` most specifically.
///
/// Every admissible variant is scored, the highest score wins and ties go to
/// the one declared first. Only `None` when the catalog has no variant at all.
pub fn resolve_variant<'c>(
    catalog: &'c dyn SyscallCatalog,
    sysno: Sysno,
    args: &[Literal],
    tracker: &ResourceTracker,
    pid: Pid,
) -> Option<VariantChoice<'c>> {
    let mut best: Option<VariantChoice<'c>> = None;
    for variant in catalog.variants_for(sysno) {
        let matcher = Matcher {
            catalog,
            tracker,
            pid,
            specialized: !variant.is_base(),
        };
        let Some(score) = matcher.score_variant(variant, args) else {
            debug!(variant = %variant.name, "variant does not admit the traced literals");
            continue;
        };
        match best {
            Some(leader) if leader.score >= score => {}
            _ => {
                best = Some(VariantChoice {
                    variant,
                    score,
                    fallback: false,
                })
            }
        }
    }
    best.or_else(|| {
        let variant = catalog.base_variant(sysno)?;
        debug!(variant = %variant.name, "no variant fits, coercing into the generic one");
        Some(VariantChoice {
            variant,
            score: 0,
            fallback: true,
        })
    })
}

/// The union branch a struct literal was rendered from, if any.
pub fn select_branch<'u>(
    catalog: &dyn SyscallCatalog,
    union: &'u UnionType,
    entries: &[StructEntry],
) -> Option<&'u UnionBranch> {
    let tag = match union.selector {
        BranchSelector::FieldValue(name) => literal_value(discriminant(entries, name)?, catalog)?,
        BranchSelector::LeadingNul(name) => match &named_entry(entries, name)?.value {
            Literal::Buffer(path) if path.decoded.first() == Some(&0) => UNIX_ABSTRACT_TAG,
            Literal::Buffer(_) => UNIX_PATH_TAG,
            _ => return None,
        },
    };
    catalog.branch_for(union, tag)
}

// the named entry, or the leading one when strace printed bare values
pub fn discriminant<'l>(entries: &'l [StructEntry], name: &str) -> Option<&'l Literal> {
    match named_entry(entries, name) {
        Some(entry) => Some(&entry.value),
        None if entries.iter().all(|entry| entry.name.is_none()) => {
            entries.first().map(|entry| &entry.value)
        }
        None => None,
    }
}

fn named_entry<'l>(entries: &'l [StructEntry], name: &str) -> Option<&'l StructEntry> {
    entries
        .iter()
        .find(|entry| entry.name.as_deref() == Some(name))
}

struct Matcher<'a> {
    catalog: &'a dyn SyscallCatalog,
    tracker: &'a ResourceTracker,
    pid: Pid,
    specialized: bool,
}

impl Matcher<'_> {
    fn score_variant(&self, variant: &SyscallVariant, args: &[Literal]) -> Option<u32> {
        if args.len() > variant.fields.len() {
            return None;
        }
        // trailing fields without a literal take their default
        variant
            .fields
            .iter()
            .zip(args)
            .try_fold(0, |total, (field, literal)| {
                Some(total + self.score(literal, &field.ty)?)
            })
    }

    fn score(&self, literal: &Literal, ty: &FieldType) -> Option<u32> {
        match ty {
            FieldType::Const { value, int } => {
                let traced = literal_value(literal, self.catalog)?;
                let matches =
                    truncate_to_width(traced, int.width) == truncate_to_width(*value, int.width);
                matches.then_some(2)
            }
            FieldType::Flags { values, .. } => {
                if !literal.is_numeric() {
                    return None;
                }
                Some(u32::from(flag_terms_known(literal, values, self.catalog)))
            }
            FieldType::Int(_) | FieldType::Len { .. } => literal.is_numeric().then_some(0),
            FieldType::Buffer(_) => match literal {
                Literal::Buffer(_) | Literal::Array(_) | Literal::MacAddress(_) => Some(0),
                // only the address was printed
                Literal::Integer(_) | Literal::Null => Some(0),
                _ => None,
            },
            FieldType::Ptr { elem, .. } => match literal {
                Literal::Null | Literal::Integer(_) => Some(0),
                Literal::Array(elements) if elem.is_scalar() && elements.len() == 1 => {
                    self.score(&elements[0], elem)
                }
                pointee => self.score(pointee, elem),
            },
            FieldType::Struct(layout) => match literal {
                Literal::Struct(entries) => self.score_struct(layout, entries),
                _ => None,
            },
            FieldType::Union(union) => {
                let Literal::Struct(entries) = literal else {
                    return None;
                };
                let branch = select_branch(self.catalog, union, entries)?;
                self.score(literal, &branch.ty)
            }
            FieldType::Array { elem, .. } => match literal {
                Literal::Array(elements) => elements
                    .iter()
                    .try_fold(0, |total, element| Some(total + self.score(element, elem)?)),
                Literal::Struct(entries) if entries.iter().all(|entry| entry.name.is_none()) => {
                    entries.iter().try_fold(0, |total, entry| {
                        Some(total + self.score(&entry.value, elem)?)
                    })
                }
                Literal::Buffer(_) if elem.is_byte() => Some(0),
                _ => None,
            },
            FieldType::Resource { kind, dir } => self.score_resource(literal, kind, dir.produces()),
        }
    }

    fn score_struct(&self, layout: &StructType, entries: &[StructEntry]) -> Option<u32> {
        let mut total = 0;
        for (position, entry) in entries.iter().enumerate() {
            let field = match &entry.name {
                Some(name) => match layout.field_index(name) {
                    Some(index) => &layout.fields[index],
                    None => continue,
                },
                None => layout.fields.get(position)?,
            };
            total += self.score(&entry.value, &field.ty)?;
        }
        Some(total)
    }

    fn score_resource(&self, literal: &Literal, kind: &ResourceKind, produced: bool) -> Option<u32> {
        let raw = literal_value(literal, self.catalog)?;
        if produced || kind.is_sentinel(raw) {
            return Some(0);
        }
        match self.tracker.lookup(self.pid, raw, kind) {
            Some(handle) if handle.kind.descends_from(kind) => Some(kind.lineage.len() as u32),
            // a handle of a coarser or sibling kind only fits the generic descriptor
            Some(_) if self.specialized => None,
            _ => Some(0),
        }
    }
}
