//! Default hidden-content naming
//!
//! ```text
//! List<T>          §ts   : T[]        multiplicity 2
//! Optional<T>      §t    : T          multiplicity 1
//! List<T[]>        §tss  : T[][]
//! Map<K,V>         §kvs  : (K,V)[]    components §k, §v
//! List<String>     §$s   : String[]   concrete element
//! mutable types    §m
//! ```

use crate::features::linkage::ports::{HiddenContentProvider, TypeModel, VirtualFields};
use crate::shared::models::{
    FieldInfo, FieldRef, ParameterizedType, TypeBase, TypeName, VirtualKind,
};
use std::sync::Arc;

pub struct DefaultHiddenContent {
    model: Arc<dyn TypeModel>,
}

impl DefaultHiddenContent {
    pub fn new(model: Arc<dyn TypeModel>) -> Self {
        Self { model }
    }

    fn mutation(owner: &TypeName) -> FieldRef {
        Arc::new(FieldInfo::new_virtual(
            owner,
            "§m",
            ParameterizedType::boolean(),
            VirtualKind::Mutation,
        ))
    }

    /// Element types of a container, the declared type parameters when raw
    fn element_types(&self, ty: &ParameterizedType) -> Option<(TypeName, u32, Vec<ParameterizedType>)> {
        let info = self.model.type_info(ty.type_name()?)?;
        if info.hidden_content_multiplicity == 0 || info.type_parameters.is_empty() {
            return None;
        }
        let args = if ty.parameters.len() == info.type_parameters.len() {
            ty.parameters.clone()
        } else {
            info.type_parameters
                .iter()
                .map(ParameterizedType::type_parameter)
                .collect()
        };
        Some((info.name.clone(), info.hidden_content_multiplicity, args))
    }
}

fn name_part(element: &ParameterizedType) -> String {
    match &element.base {
        TypeBase::TypeParameter(tp) => tp.name.to_lowercase(),
        TypeBase::Tuple(components) => components.iter().map(name_part).collect(),
        _ => "$".to_string(),
    }
}

fn hidden_content_name(part: &str, arrays: u32) -> String {
    format!("§{}{}", part, "s".repeat(arrays as usize))
}

impl HiddenContentProvider for DefaultHiddenContent {
    fn virtual_fields(&self, ty: &ParameterizedType) -> VirtualFields {
        if ty.arrays > 0 {
            return VirtualFields {
                mutation: Some(Self::mutation(&TypeName::new("[]"))),
                hidden_content: None,
            };
        }
        let Some(name) = ty.type_name() else {
            return VirtualFields::NONE;
        };
        let mutation = if self.model.is_mutable(ty) {
            Some(Self::mutation(name))
        } else {
            None
        };
        let hidden_content = self.element_types(ty).map(|(owner, multiplicity, args)| {
            let extra = multiplicity.saturating_sub(1);
            let element = if args.len() == 1 {
                args[0].clone()
            } else {
                ParameterizedType::tuple(args)
            };
            let arrays = element.arrays + extra;
            Arc::new(FieldInfo::new_virtual(
                &owner,
                &hidden_content_name(&name_part(&element), arrays),
                element.with_arrays(arrays),
                VirtualKind::HiddenContent,
            ))
        });
        VirtualFields {
            mutation,
            hidden_content,
        }
    }

    fn components(&self, ty: &ParameterizedType) -> Vec<FieldRef> {
        let Some(components) = ty.tuple_components() else {
            return Vec::new();
        };
        let owner = TypeName::new("§tuple");
        components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Arc::new(FieldInfo::new_virtual(
                    &owner,
                    &format!("§{}", name_part(c)),
                    c.clone(),
                    VirtualKind::Component(i as u32),
                ))
            })
            .collect()
    }

    fn retarget(&self, field: &FieldRef, scope_ty: &ParameterizedType) -> FieldRef {
        match field.virtual_kind {
            Some(VirtualKind::Mutation) => self
                .mutation_field(scope_ty)
                .unwrap_or_else(|| field.clone()),
            Some(VirtualKind::HiddenContent) => match self.hidden_content(scope_ty) {
                Some(hc) if hc.ty.arrays == field.ty.arrays => hc,
                Some(hc) => {
                    // a derived view with a different dimension over the same storage
                    let mut element = hc.ty.clone();
                    element.arrays = 0;
                    self.virtual_field(&element, field.ty.arrays, &hc.owner)
                }
                None => field.clone(),
            },
            Some(VirtualKind::Component(i)) => self
                .components(scope_ty)
                .get(i as usize)
                .cloned()
                .unwrap_or_else(|| field.clone()),
            None => field.clone(),
        }
    }

    fn virtual_field(&self, element: &ParameterizedType, arrays: u32, owner: &TypeName) -> FieldRef {
        Arc::new(FieldInfo::new_virtual(
            owner,
            &hidden_content_name(&name_part(element), arrays),
            element.clone().with_arrays(arrays),
            VirtualKind::HiddenContent,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ProgramBuilder, TypeInfo};

    fn provider() -> (DefaultHiddenContent, TypeInfo, TypeInfo, TypeInfo) {
        let list = TypeInfo::new("java.util.List")
            .type_parameter("E")
            .mutable(true)
            .multiplicity(2);
        let optional = TypeInfo::new("java.util.Optional")
            .type_parameter("T")
            .multiplicity(1);
        let map = TypeInfo::new("java.util.Map")
            .type_parameter("K")
            .type_parameter("V")
            .mutable(true)
            .multiplicity(2);
        let mut builder = ProgramBuilder::new();
        builder
            .add_type(list.clone())
            .add_type(optional.clone())
            .add_type(map.clone());
        let program: Arc<dyn TypeModel> = Arc::new(builder.build());
        (DefaultHiddenContent::new(program), list, optional, map)
    }

    #[test]
    fn test_naming_scheme() {
        let (p, list, optional, map) = provider();
        let vf = p.virtual_fields(&list.this_type());
        assert_eq!(vf.hidden_content.as_ref().map(|f| f.name.to_string()), Some("§es".into()));
        assert_eq!(vf.hidden_content.map(|f| f.ty.arrays), Some(1));
        assert!(vf.mutation.is_some());

        let vf = p.virtual_fields(&optional.this_type());
        assert_eq!(vf.hidden_content.map(|f| f.name.to_string()), Some("§t".into()));
        assert!(vf.mutation.is_none());

        let hc = p.hidden_content(&map.this_type()).unwrap();
        assert_eq!(&*hc.name, "§kvs");
        let components = p.components(&hc.ty);
        assert_eq!(components.len(), 2);
        assert_eq!(&*components[1].name, "§v");
    }

    #[test]
    fn test_concrete_and_array_elements() {
        let (p, list, _, _) = provider();
        let strings = ParameterizedType::generic(&list.name, vec![ParameterizedType::string()]);
        assert_eq!(&*p.hidden_content(&strings).unwrap().name, "§$s");

        let e = list.tp("E").unwrap();
        let arrays = ParameterizedType::generic(
            &list.name,
            vec![ParameterizedType::type_parameter(&e).with_arrays(1)],
        );
        assert_eq!(&*p.hidden_content(&arrays).unwrap().name, "§ess");

        let vf = p.virtual_fields(&ParameterizedType::int().with_arrays(1));
        assert!(vf.mutation.is_some() && vf.hidden_content.is_none());
        assert_eq!(p.virtual_fields(&ParameterizedType::int()), VirtualFields::NONE);
    }

    #[test]
    fn test_retarget_follows_scope_type() {
        let (p, list, _, _) = provider();
        let formal = p.hidden_content(&list.this_type()).unwrap();
        let strings = ParameterizedType::generic(&list.name, vec![ParameterizedType::string()]);
        assert_eq!(&*p.retarget(&formal, &strings).name, "§$s");
    }
}
