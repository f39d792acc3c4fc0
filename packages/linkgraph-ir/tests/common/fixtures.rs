//! Library types shared by the scenarios
//!
//! All of them are external: their methods only carry declared facts.

use linkgraph_ir::shared::models::{
    Independence, MethodBuilder, MethodFacts, MethodRef, ParameterFacts, ParameterizedType,
    ProgramBuilder, TypeInfo, TypeName,
};

pub struct Library {
    pub item: TypeName,
    pub collection: TypeName,
    pub list: TypeName,
    pub array_list: TypeName,
    pub linked_list: TypeName,
    pub supplier: TypeName,
    /// `List.add(E)`, modifying
    pub list_add: MethodRef,
    /// `ArrayList(Collection<E>)`, copies the elements
    pub array_list_copy: MethodRef,
    /// `LinkedList(Collection<E>)`, no declared facts
    pub linked_list_copy: MethodRef,
    /// `List.view()`, returns a list over the same elements; no declared facts
    pub list_view: MethodRef,
    /// `Supplier.get()`
    pub supplier_get: MethodRef,
}

impl Library {
    pub fn item_type(&self) -> ParameterizedType {
        ParameterizedType::class(&self.item)
    }

    pub fn list_of(&self, element: ParameterizedType) -> ParameterizedType {
        ParameterizedType::generic(&self.list, vec![element])
    }

    pub fn array_list_of(&self, element: ParameterizedType) -> ParameterizedType {
        ParameterizedType::generic(&self.array_list, vec![element])
    }

    pub fn linked_list_of(&self, element: ParameterizedType) -> ParameterizedType {
        ParameterizedType::generic(&self.linked_list, vec![element])
    }

    pub fn supplier_of(&self, result: ParameterizedType) -> ParameterizedType {
        ParameterizedType::generic(&self.supplier, vec![result])
    }
}

/// Add the library types to `builder`
pub fn library(builder: &mut ProgramBuilder) -> Library {
    let item = TypeInfo::new("a.Item");
    let item_name = item.name.clone();
    builder.add_type(item);

    let collection = TypeInfo::new("java.util.Collection")
        .type_parameter("E")
        .mutable(true)
        .external(true)
        .multiplicity(2);
    let collection_name = collection.name.clone();
    builder.add_type(collection);

    let list = TypeInfo::new("java.util.List")
        .type_parameter("E")
        .super_type(&collection_name)
        .mutable(true)
        .external(true)
        .multiplicity(2);
    let list_name = list.name.clone();
    let e = ParameterizedType::type_parameter(&list.tp("E").unwrap());
    let add = MethodBuilder::new(&list_name, "add")
        .parameter("e", e)
        .abstract_method()
        .facts(MethodFacts::default().modifying(true));
    let list_add = add.id();
    let view = MethodBuilder::new(&list_name, "view")
        .returns(list.this_type())
        .abstract_method();
    let list_view = view.id();
    builder.add_type(list);
    builder.add_method(add.build());
    builder.add_method(view.build());

    let array_list = TypeInfo::new("java.util.ArrayList")
        .type_parameter("E")
        .super_type(&list_name)
        .mutable(true)
        .external(true)
        .multiplicity(2);
    let array_list_name = array_list.name.clone();
    let e = ParameterizedType::type_parameter(&array_list.tp("E").unwrap());
    let copy = MethodBuilder::constructor(&array_list_name)
        .parameter("c", ParameterizedType::generic(&collection_name, vec![e]))
        .facts(MethodFacts::default().parameter(
            0,
            ParameterFacts {
                modified: false,
                independence: Independence::independent_hc(),
            },
        ));
    let array_list_copy = copy.id();
    builder.add_type(array_list);
    builder.add_method(copy.build());

    let linked_list = TypeInfo::new("java.util.LinkedList")
        .type_parameter("E")
        .super_type(&list_name)
        .mutable(true)
        .external(true)
        .multiplicity(2);
    let linked_list_name = linked_list.name.clone();
    let e = ParameterizedType::type_parameter(&linked_list.tp("E").unwrap());
    let copy = MethodBuilder::constructor(&linked_list_name)
        .parameter("c", ParameterizedType::generic(&collection_name, vec![e]));
    let linked_list_copy = copy.id();
    builder.add_type(linked_list);
    builder.add_method(copy.build());

    let supplier = TypeInfo::new("java.util.function.Supplier").type_parameter("T");
    let supplier_name = supplier.name.clone();
    let t = ParameterizedType::type_parameter(&supplier.tp("T").unwrap());
    let get = MethodBuilder::new(&supplier_name, "get")
        .returns(t)
        .abstract_method();
    let supplier_get = get.id();
    builder.add_type(supplier.external(true).functional(&supplier_get));
    builder.add_method(get.build());

    Library {
        item: item_name,
        collection: collection_name,
        list: list_name,
        array_list: array_list_name,
        linked_list: linked_list_name,
        supplier: supplier_name,
        list_add,
        array_list_copy,
        linked_list_copy,
        list_view,
        supplier_get,
    }
}
