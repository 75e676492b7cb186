//! Shared test databases.

use crate::graph::{DatabaseBuilder, Entity, EntityId, MemoryDatabase, Token, TokenCategory};

/// The two-class scenario: `ClassA.methodA1` calls `ClassB.methodB1` once,
/// at X.src line 10.
pub fn two_classes() -> MemoryDatabase {
    let mut b = DatabaseBuilder::new("two-classes");
    let x = b.add(1, "X.src", "X.src", "File");
    let a = b.add(2, "ClassA", "ClassA", "Class");
    let a1 = b.add(3, "methodA1", "ClassA.methodA1", "Method");
    let cb = b.add(4, "ClassB", "ClassB", "Class");
    let b1 = b.add(5, "methodB1", "ClassB.methodB1", "Method");
    b.link(x, "define", a, x, 1, 1)
        .link(x, "define", cb, x, 12, 1)
        .link(a, "define", a1, x, 2, 5)
        .link(cb, "define", b1, x, 13, 5)
        .link(a1, "call", b1, x, 10, 9);
    b.build().expect("two-class fixture")
}

/// A small Java task manager: an interface, an abstract base class, two
/// concrete classes and a main class, with calls, field accesses and two
/// placeholder entities from the JDK.
pub fn sample_project() -> MemoryDatabase {
    let mut b = DatabaseBuilder::new("SampleProject");
    b.language("Java");

    let member = |id: u32, name: &str, owner: &str, kind: &str, ty: &str| {
        Entity::new(id, name, format!("{owner}.{name}"), kind).with_types([ty])
    };

    let file = b.add(1, "SampleProject.java", "sample/SampleProject.java", "File");
    let printable = b.add(2, "Printable", "sample.Printable", "Interface");
    let display = b.entity(member(3, "toDisplayString", "sample.Printable", "Abstract Method", "String"));
    let base = b.add(4, "BaseItem", "sample.BaseItem", "Abstract Class");
    let id = b.entity(member(5, "id", "sample.BaseItem", "Private Final Variable", "int"));
    let name = b.entity(member(6, "name", "sample.BaseItem", "Private Final Variable", "String"));
    let get_id = b.entity(member(7, "getId", "sample.BaseItem", "Public Method", "int"));
    let get_name = b.entity(member(8, "getName", "sample.BaseItem", "Public Method", "String"));
    let base_display = b.entity(member(9, "toDisplayString", "sample.BaseItem", "Public Method", "String"));
    let base_valid = b.entity(member(10, "isValid", "sample.BaseItem", "Public Abstract Method", "boolean"));
    let task = b.add(11, "Task", "sample.Task", "Class");
    let complete = b.entity(member(12, "complete", "sample.Task", "Public Method", "void"));
    let is_completed = b.entity(member(13, "isCompleted", "sample.Task", "Public Method", "boolean"));
    let task_valid = b.entity(member(14, "isValid", "sample.Task", "Public Method", "boolean"));
    let completed = b.entity(member(15, "completed", "sample.Task", "Private Variable", "boolean"));
    let manager = b.add(16, "TaskManager", "sample.TaskManager", "Class");
    let add_task = b.entity(member(17, "addTask", "sample.TaskManager", "Public Method", "void"));
    let find_by_id = b.entity(member(18, "findById", "sample.TaskManager", "Public Method", "Task"));
    let complete_task = b.entity(member(19, "completeTask", "sample.TaskManager", "Public Method", "void"));
    let tasks = b.entity(member(20, "tasks", "sample.TaskManager", "Private Final Variable", "java.util.List<Task>"));
    let main_class = b.add(21, "SampleProject", "sample.SampleProject", "Public Class");
    let main = b.entity(member(22, "main", "sample.SampleProject", "Public Static Method", "void"));
    let array_list = b.add(23, "ArrayList", "java.util.ArrayList", "Unresolved Class");
    let println = b.add(24, "println", "java.io.PrintStream.println", "Unknown Method");

    b.link(file, "define", printable, file, 9, 11)
        .link(file, "define", base, file, 14, 16)
        .link(file, "define", task, file, 40, 7)
        .link(file, "define", manager, file, 83, 7)
        .link(file, "define", main_class, file, 135, 14)
        .link(printable, "define", display, file, 10, 12)
        .link(base, "implement", printable, file, 14, 36)
        .link(base, "define", id, file, 15, 23)
        .link(base, "define", name, file, 16, 26)
        .link(base, "define", get_id, file, 23, 16)
        .link(base, "define", get_name, file, 27, 19)
        .link(base, "define", base_display, file, 32, 19)
        .link(base, "define", base_valid, file, 36, 28)
        .link(get_id, "use", id, file, 24, 16)
        .link(get_name, "use", name, file, 28, 16)
        .link(task, "extend", base, file, 40, 25)
        .link(task, "define", completed, file, 44, 21)
        .link(task, "define", is_completed, file, 61, 20)
        .link(task, "define", complete, file, 65, 17)
        .link(task, "define", task_valid, file, 70, 20)
        .link(is_completed, "use", completed, file, 62, 16)
        .link(complete, "set", completed, file, 66, 14)
        .link(task_valid, "call", get_name, file, 71, 16)
        .link(task_valid, "call", get_name, file, 71, 40)
        .link(manager, "define", tasks, file, 84, 37)
        .link(manager, "create", array_list, file, 84, 51)
        .link(manager, "define", add_task, file, 86, 17)
        .link(manager, "define", find_by_id, file, 92, 17)
        .link(manager, "define", complete_task, file, 110, 17)
        .link(add_task, "call", task_valid, file, 87, 18)
        .link(add_task, "use", tasks, file, 88, 13)
        .link(find_by_id, "use", tasks, file, 93, 28)
        .link(find_by_id, "call", get_id, file, 94, 22)
        .link(complete_task, "call", find_by_id, file, 111, 21)
        .link(complete_task, "call", complete, file, 113, 18)
        .link(main_class, "define", main, file, 136, 24)
        .link(main, "create", manager, file, 137, 35)
        .link(main, "call", add_task, file, 139, 17)
        .link(main, "call", add_task, file, 140, 17)
        .link(main, "call", add_task, file, 141, 17)
        .link(main, "call", complete_task, file, 143, 17)
        .link(main, "call", println, file, 146, 20);

    b.tokens(
        file,
        vec![
            Token::new(TokenCategory::Keyword, "package", 1, 1),
            Token::new(TokenCategory::Whitespace, " ", 1, 8),
            Token::new(TokenCategory::Identifier, "sample", 1, 9),
            Token::new(TokenCategory::Punctuation, ";", 1, 15),
            Token::new(TokenCategory::Newline, "\n", 1, 16),
            Token::new(TokenCategory::Comment, "// --- interface ---", 8, 1),
            Token::new(TokenCategory::Newline, "\n", 8, 21),
            Token::new(TokenCategory::Keyword, "interface", 9, 1),
            Token::new(TokenCategory::Whitespace, " ", 9, 10),
            Token::new(TokenCategory::Identifier, "Printable", 9, 11).with_entity(printable),
            Token::new(TokenCategory::Whitespace, " ", 9, 20),
            Token::new(TokenCategory::Punctuation, "{", 9, 21),
            Token::new(TokenCategory::Newline, "\n", 9, 22),
            Token::new(TokenCategory::Whitespace, "    ", 10, 1),
            Token::new(TokenCategory::Identifier, "String", 10, 5),
            Token::new(TokenCategory::Whitespace, " ", 10, 11),
            Token::new(TokenCategory::Identifier, "toDisplayString", 10, 12).with_entity(display),
            Token::new(TokenCategory::Punctuation, "();", 10, 27),
        ],
    );

    b.build().expect("sample project fixture")
}

/// Look up an entity id by long name in a fixture.
pub fn id_of(db: &MemoryDatabase, longname: &str) -> EntityId {
    db.snapshot()
        .entities
        .iter()
        .find(|e| e.longname == longname)
        .map(|e| e.id)
        .unwrap_or_else(|| panic!("no entity {longname}"))
}
