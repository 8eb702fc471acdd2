mod entry_type;
mod food;
mod meal_plan;
mod shopping_list;

pub use entry_type::EntryType;
pub use food::Food;
pub use meal_plan::MealPlanEntry;
pub use shopping_list::{
    ItemEdit, ItemMutations, ItemUpdate, ListDetail, NewItem, RecipeReference, ShoppingList,
    ShoppingListItem, ValidationError, DEFAULT_QUANTITY,
};
