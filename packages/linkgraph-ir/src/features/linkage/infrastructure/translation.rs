//! Variable translation under a substitution map
//!
//! Used to inline a callee summary at a call site: receiver → object,
//! parameter → argument, return value → result temporary. Fields and elements
//! are rebuilt over translated scopes; hidden-content fields are retargeted
//! to the naming of the new scope's type.

use crate::features::linkage::domain::{Link, Links};
use crate::features::linkage::ports::HiddenContentProvider;
use crate::shared::models::{Index, Variable, VariableKind};
use rustc_hash::FxHashMap;

pub struct TranslationMap<'a> {
    direct: FxHashMap<Variable, Variable>,
    provider: &'a dyn HiddenContentProvider,
}

impl<'a> TranslationMap<'a> {
    pub fn new(provider: &'a dyn HiddenContentProvider) -> Self {
        Self {
            direct: FxHashMap::default(),
            provider,
        }
    }

    pub fn put(&mut self, from: &Variable, to: &Variable) {
        if from != to {
            self.direct.insert(from.clone(), to.clone());
        }
    }

    /// Builder form of `put`
    pub fn with(mut self, from: &Variable, to: &Variable) -> Self {
        self.put(from, to);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }

    pub fn translate(&self, v: &Variable) -> Variable {
        if let Some(t) = self.direct.get(v) {
            return t.clone();
        }
        match v.kind() {
            VariableKind::Field {
                field,
                scope: Some(scope),
            } => {
                let new_scope = self.translate(scope);
                if &new_scope == scope {
                    return v.clone();
                }
                let field = if field.is_virtual() {
                    self.provider.retarget(field, new_scope.ty())
                } else {
                    field.clone()
                };
                Variable::field(field, Some(new_scope))
            }
            VariableKind::Element { array, index } => {
                let new_array = self.translate(array);
                let new_index = match index {
                    Index::Variable(i) => Index::Variable(self.translate(i)),
                    Index::Constant(c) => Index::Constant(*c),
                };
                if &new_array == array && &new_index == index {
                    v.clone()
                } else {
                    Variable::element(new_array, new_index)
                }
            }
            _ => v.clone(),
        }
    }

    pub fn translate_link(&self, link: &Link) -> Link {
        link.map(&mut |v| self.translate(v))
    }

    pub fn translate_links(&self, links: &Links) -> Links {
        links.map_variables(&mut |v| self.translate(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::linkage::infrastructure::hidden_content::DefaultHiddenContent;
    use crate::features::linkage::ports::{HiddenContentProvider, TypeModel};
    use crate::shared::models::{MethodRef, ParameterizedType, ProgramBuilder, TypeInfo};
    use std::sync::Arc;

    #[test]
    fn test_translate_retargets_hidden_content() {
        let list = TypeInfo::new("java.util.List")
            .type_parameter("E")
            .mutable(true)
            .multiplicity(2);
        let mut builder = ProgramBuilder::new();
        builder.add_type(list.clone());
        let model: Arc<dyn TypeModel> = Arc::new(builder.build());
        let provider = DefaultHiddenContent::new(model);

        let this = list.this_variable();
        let hc = provider.hidden_content(&list.this_type()).unwrap();
        let this_hc = Variable::field(hc, Some(this.clone()));

        let caller = MethodRef::new("a.C.m(List)");
        let strings = ParameterizedType::generic(&list.name, vec![ParameterizedType::string()]);
        let arg = Variable::parameter(&caller, 0, "in", strings);

        let map = TranslationMap::new(&provider).with(&this, &arg);
        let translated = map.translate(&this_hc);
        assert_eq!(translated.to_string(), "0:in.§$s");
        assert_eq!(translated.scope(), Some(&arg));

        let unrelated = Variable::local("x", ParameterizedType::string());
        assert_eq!(map.translate(&unrelated), unrelated);
    }
}
