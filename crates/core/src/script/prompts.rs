use chrono::NaiveDate;

use crate::domain::schedule::{Slot, SlotOffer};
use crate::domain::session::CallSession;
use crate::pricing::QuoteBreakdown;
use crate::script::states::CallStage;

pub fn greeting() -> String {
    concat!(
        "Thanks for calling Moveline Moving. ",
        "Press 1 or say quote for a moving quote, ",
        "press 2 or say link to get a booking link by text."
    )
    .to_owned()
}

/// The spoken prompt for a gather stage. System and terminal stages have no
/// prompt of their own; their text comes from the transition that lands on
/// them.
pub fn prompt_for(stage: CallStage, session: &CallSession) -> String {
    match stage {
        CallStage::MainMenu => greeting(),
        CallStage::ServiceType => {
            "Press 1 for full-service moving, where our crew drives the truck, \
             or press 2 for labor-only help loading and unloading."
                .to_owned()
        }
        CallStage::PickupAddress => {
            "What is the full pickup address, including the city?".to_owned()
        }
        CallStage::PickupHomeType => {
            "Is the pickup a house, an apartment, or a storage unit? \
             Press 1 for house, 2 for apartment, 3 for storage."
                .to_owned()
        }
        CallStage::PickupBedrooms => "How many bedrooms are at the pickup?".to_owned(),
        CallStage::PickupStairs => {
            "Are there stairs at the pickup? Say yes or no.".to_owned()
        }
        CallStage::DeliveryAddress => {
            "What is the full delivery address, including the city?".to_owned()
        }
        CallStage::DeliveryHomeType => {
            "Is the delivery a house, an apartment, or a storage unit? \
             Press 1 for house, 2 for apartment, 3 for storage."
                .to_owned()
        }
        CallStage::DeliveryBedrooms => "How many bedrooms are at the delivery?".to_owned(),
        CallStage::DeliveryStairs => {
            "Are there stairs at the delivery? Say yes or no.".to_owned()
        }
        CallStage::Appliances => {
            "Will we be moving any appliances, like a washer or refrigerator? \
             Say yes or no."
                .to_owned()
        }
        CallStage::AppliancesDetails => "Which appliances should we plan for?".to_owned(),
        CallStage::HeavyItems => {
            "Any extra-heavy items, like a piano or a safe? Say yes or no.".to_owned()
        }
        CallStage::HeavyItemsDetails => "Tell me about those heavy items.".to_owned(),
        CallStage::PackingServices => {
            "Would you like us to handle packing as well? Say yes or no.".to_owned()
        }
        CallStage::Decision => match &session.quote {
            Some(quote) => quote_readback(quote),
            None => "I wasn't able to put a quote together.".to_owned(),
        },
        CallStage::EmailQuote => {
            "What email address should I send the quote to?".to_owned()
        }
        CallStage::BookingStart => {
            "Great, let's get you booked. What is your first and last name?".to_owned()
        }
        CallStage::BookingContact => {
            "What email address should we send the confirmation to?".to_owned()
        }
        CallStage::BookingDate => {
            "What date would you like to move? You can say something like March twelfth."
                .to_owned()
        }
        CallStage::BookingSlot => slot_offer_prompt(session.slot_offer),
        _ => String::new(),
    }
}

pub fn reprompt(stage: CallStage, session: &CallSession) -> String {
    format!("Sorry, I didn't catch that. {}", prompt_for(stage, session))
}

pub fn quote_readback(quote: &QuoteBreakdown) -> String {
    format!(
        "Your estimated total is {} dollars for {} with a {}-mover crew, \
         about {} hours of work. Press 1 or say book to schedule it, \
         press 2 or say email to receive the quote by email, \
         or say start over to change the details.",
        quote.total_rounded(),
        quote.category.label(),
        quote.crew_size,
        quote.hours
    )
}

pub fn slot_offer_prompt(offer: Option<SlotOffer>) -> String {
    match offer {
        Some(SlotOffer::Both) => {
            "We have both windows open that day. Say morning for an 8-9 AM arrival, \
             or afternoon for 1-2 PM."
                .to_owned()
        }
        Some(SlotOffer::Only(slot)) => format!(
            "The only window left that day is the {} with a {} arrival. \
             Say {} to take it, or give me another date.",
            slot.as_str(),
            slot.display_window(),
            slot.as_str()
        ),
        None => "Which window works better, morning or afternoon?".to_owned(),
    }
}

pub fn no_slots_available(date: NaiveDate) -> String {
    format!(
        "I'm sorry, both windows on {} are already taken. \
         Is there another date that works for you?",
        date.format("%B %-d")
    )
}

pub fn slot_taken_apology(date: NaiveDate, slot: Slot) -> String {
    format!(
        "I'm sorry, the {} window on {} was just taken. \
         Is there another date that works for you?",
        slot.as_str(),
        date.format("%B %-d")
    )
}

pub fn booking_confirmed(reference: &str, date: NaiveDate, slot: Slot) -> String {
    format!(
        "You're all set. Your booking reference is {reference}, \
         and the crew will arrive {} on {}. \
         A confirmation is on its way to your email and phone. Thanks for choosing Moveline!",
        slot.display_window(),
        date.format("%B %-d")
    )
}

pub fn booking_link_sent() -> String {
    "A booking link is on its way to your phone by text. Thanks for calling Moveline!"
        .to_owned()
}

pub fn quote_emailed(quote: Option<&QuoteBreakdown>) -> String {
    match quote {
        Some(quote) => format!(
            "Your quote for {} dollars is on its way to your email. Thanks for calling Moveline!",
            quote.total_rounded()
        ),
        None => "Your quote is on its way to your email. Thanks for calling Moveline!".to_owned(),
    }
}

pub fn transfer_text() -> String {
    "Let me connect you with one of our moving specialists. One moment please.".to_owned()
}

pub fn escape_deflection() -> String {
    "I can get you a quote in about two minutes right here. \
     Press 1 or say quote to continue, or press 0 again to reach a specialist."
        .to_owned()
}
